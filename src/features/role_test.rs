use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::store::{keys, LocalStore};

pub const ROLE_TEST_XP: i64 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Pm,
    Dev,
    Design,
    Ml,
}

impl Role {
    /// Tie-break order.
    pub const ALL: [Role; 4] = [Role::Pm, Role::Dev, Role::Design, Role::Ml];

    pub fn profile(self) -> RoleProfile {
        match self {
            Role::Pm => RoleProfile {
                title: "Project Manager",
                icon: "👑",
                subtitle: "Leader and organiser of the team",
                skills: &["Project management", "Communication", "Notion/Jira", "Pitching", "Time management"],
                color: "#7c3aed",
            },
            Role::Dev => RoleProfile {
                title: "Full-Stack Developer",
                icon: "💻",
                subtitle: "The technical backbone of the team",
                skills: &["React / Vue", "Python / Node.js", "REST API", "Git", "Databases"],
                color: "#3ecfcf",
            },
            Role::Design => RoleProfile {
                title: "UX/UI Designer",
                icon: "🎨",
                subtitle: "Visionary and experience architect",
                skills: &["Figma", "UX research", "Prototyping", "Design systems", "Animation"],
                color: "#ec4899",
            },
            Role::Ml => RoleProfile {
                title: "ML / Data Engineer",
                icon: "🤖",
                subtitle: "Data scientist and AI engineer",
                skills: &["Python", "TensorFlow/PyTorch", "Pandas / NumPy", "ML algorithms", "API integration"],
                color: "#f59e0b",
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleProfile {
    pub title: &'static str,
    pub icon: &'static str,
    pub subtitle: &'static str,
    pub skills: &'static [&'static str],
    pub color: &'static str,
}

pub struct RoleQuestion {
    pub prompt: &'static str,
    /// One option per role, in [`Role::ALL`] order.
    pub options: [(&'static str, Role); 4],
}

pub const QUESTION_COUNT: usize = 6;

pub static QUESTIONS: [RoleQuestion; QUESTION_COUNT] = [
    RoleQuestion {
        prompt: "What scares you most at a hackathon?",
        options: [
            ("The pitch is in 2 hours and the slides aren't ready", Role::Pm),
            ("The code doesn't compile 30 minutes before the deadline", Role::Dev),
            ("The design looks awful and the jury is looking at the UI", Role::Design),
            ("There's no data and the model has to train overnight", Role::Ml),
        ],
    },
    RoleQuestion {
        prompt: "You got a task. What do you do first?",
        options: [
            ("Split it into subtasks with deadlines", Role::Pm),
            ("Open the editor and start coding", Role::Dev),
            ("Look for references and sketch", Role::Design),
            ("Study the data and possible approaches", Role::Ml),
        ],
    },
    RoleQuestion {
        prompt: "What do you find most exciting?",
        options: [
            ("The whole team working in sync", Role::Pm),
            ("Finally fixing a hard bug", Role::Dev),
            ("A beautiful UI that wows people", Role::Design),
            ("A model reaching high accuracy", Role::Ml),
        ],
    },
    RoleQuestion {
        prompt: "Which tool do you use most?",
        options: [
            ("Notion / Trello / Jira", Role::Pm),
            ("VS Code / GitHub / Terminal", Role::Dev),
            ("Figma / Adobe / Sketch", Role::Design),
            ("Jupyter / Python / PyTorch", Role::Ml),
        ],
    },
    RoleQuestion {
        prompt: "How do your friends describe you?",
        options: [
            ("A diplomat who listens and negotiates", Role::Pm),
            ("A perfectionist about clean code", Role::Dev),
            ("A visionary who thinks in images", Role::Design),
            ("An analyst who checks everything against data", Role::Ml),
        ],
    },
    RoleQuestion {
        prompt: "Which superpower would you pick for a hackathon?",
        options: [
            ("Reading the minds of the jury", Role::Pm),
            ("Typing bug-free code at the speed of thought", Role::Dev),
            ("Creating the perfect UI in seconds", Role::Design),
            ("Predicting the future from any data", Role::Ml),
        ],
    },
];

/// Stored under `akyl_my_role`: the role plus its profile fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleResult {
    pub role: Role,
    pub title: String,
    pub icon: String,
    #[serde(rename = "sub")]
    pub subtitle: String,
    pub skills: Vec<String>,
    pub color: String,
}

impl From<Role> for RoleResult {
    fn from(role: Role) -> Self {
        let p = role.profile();
        Self {
            role,
            title: p.title.to_string(),
            icon: p.icon.to_string(),
            subtitle: p.subtitle.to_string(),
            skills: p.skills.iter().map(|s| s.to_string()).collect(),
            color: p.color.to_string(),
        }
    }
}

/// Answers in progress; one option index per question.
#[derive(Clone, Debug, Default)]
pub struct RoleTest {
    answers: [Option<usize>; QUESTION_COUNT],
    current: usize,
}

impl RoleTest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn question(&self) -> &'static RoleQuestion {
        &QUESTIONS[self.current]
    }

    pub fn select(&mut self, option: usize) -> Result<()> {
        if option >= 4 {
            return Err(ClientError::validation("Unknown option"));
        }
        self.answers[self.current] = Some(option);
        Ok(())
    }

    /// Move forward; the current question must be answered first.
    /// Returns true when this was the last question.
    pub fn next(&mut self) -> Result<bool> {
        if self.answers[self.current].is_none() {
            return Err(ClientError::validation("Choose an answer"));
        }
        if self.current + 1 == QUESTION_COUNT {
            return Ok(true);
        }
        self.current += 1;
        Ok(false)
    }

    pub fn back(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn scores(&self) -> [(Role, u32); 4] {
        let mut scores = Role::ALL.map(|r| (r, 0));
        for (q, answer) in QUESTIONS.iter().zip(self.answers) {
            if let Some(idx) = answer {
                let role = q.options[idx].1;
                if let Some(slot) = scores.iter_mut().find(|(r, _)| *r == role) {
                    slot.1 += 1;
                }
            }
        }
        scores
    }

    /// Winner by score; ties go to the earlier role in [`Role::ALL`].
    pub fn result(&self) -> Result<RoleResult> {
        if self.answers.iter().any(Option::is_none) {
            return Err(ClientError::validation("Answer every question"));
        }
        let mut best = (Role::Pm, 0);
        for (role, score) in self.scores() {
            if score > best.1 {
                best = (role, score);
            }
        }
        Ok(best.0.into())
    }
}

pub fn save_result(store: &LocalStore, result: &RoleResult) -> Result<()> {
    store.set_json(keys::MY_ROLE, result)
}

pub fn saved_result(store: &LocalStore) -> Option<RoleResult> {
    store.get_json(keys::MY_ROLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer_all(test: &mut RoleTest, picks: [usize; 6]) {
        for (i, pick) in picks.into_iter().enumerate() {
            test.select(pick).unwrap();
            let last = test.next().unwrap();
            assert_eq!(last, i == 5);
        }
    }

    #[test]
    fn unanswered_blocks_progress() {
        let mut test = RoleTest::new();
        assert!(test.next().is_err());
        assert!(test.result().is_err());
        assert!(test.select(4).is_err());
    }

    #[test]
    fn majority_wins() {
        let mut test = RoleTest::new();
        answer_all(&mut test, [3, 3, 1, 3, 2, 0]);
        assert_eq!(test.result().unwrap().role, Role::Ml);
    }

    #[test]
    fn ties_follow_role_order() {
        let mut test = RoleTest::new();
        answer_all(&mut test, [2, 1, 2, 1, 3, 3]);
        let result = test.result().unwrap();
        assert_eq!(result.role, Role::Dev);
        assert_eq!(result.title, "Full-Stack Developer");
    }

    #[test]
    fn persisted_shape() {
        let store = LocalStore::in_memory();
        save_result(&store, &Role::Design.into()).unwrap();
        let raw: serde_json::Value = store.get_json(keys::MY_ROLE).unwrap();
        assert_eq!(raw["role"], "DESIGN");
        assert_eq!(raw["title"], "UX/UI Designer");
        assert_eq!(saved_result(&store).unwrap().role, Role::Design);
    }
}
