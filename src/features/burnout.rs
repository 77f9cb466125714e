use std::collections::BTreeMap;

use crate::api::ai::AnswerValue;
use crate::api::models::{BurnoutQuestion, QuestionKind};
use crate::error::{ClientError, Result};

/// Value a scale slider shows before it is touched.
pub const SCALE_DEFAULT: f64 = 5.0;

/// One burnout self-check: the question set, the chosen member and the
/// answers given so far. Cleared for every new assessment.
#[derive(Clone, Debug, Default)]
pub struct BurnoutForm {
    questions: Vec<BurnoutQuestion>,
    member_id: Option<i64>,
    answers: BTreeMap<String, AnswerValue>,
}

impl BurnoutForm {
    pub fn new(questions: Vec<BurnoutQuestion>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    pub fn questions(&self) -> &[BurnoutQuestion] {
        &self.questions
    }

    pub fn member_id(&self) -> Option<i64> {
        self.member_id
    }

    pub fn select_member(&mut self, member_id: i64) {
        self.member_id = Some(member_id);
    }

    pub fn answer(&mut self, question_id: &str, value: AnswerValue) -> Result<()> {
        let Some(q) = self.questions.iter().find(|q| q.id == question_id) else {
            return Err(ClientError::validation(format!("Unknown question: {question_id}")));
        };
        let fits = matches!(
            (q.kind, &value),
            (QuestionKind::Scale | QuestionKind::Number, AnswerValue::Number(_))
                | (QuestionKind::Bool, AnswerValue::Bool(_))
                | (QuestionKind::Choice, AnswerValue::Choice(_))
        );
        if !fits {
            return Err(ClientError::validation(format!("Wrong answer type for {question_id}")));
        }
        self.answers.insert(question_id.to_string(), value);
        Ok(())
    }

    pub fn answers(&self) -> &BTreeMap<String, AnswerValue> {
        &self.answers
    }

    /// Member and answers ready for submission. Untouched scales count as
    /// the slider default; other unanswered questions are left out.
    pub fn submission(&self) -> Result<(i64, BTreeMap<String, AnswerValue>)> {
        let member_id = self
            .member_id
            .ok_or_else(|| ClientError::validation("Select a team member"))?;
        let mut answers = self.answers.clone();
        for q in self.questions.iter().filter(|q| q.kind == QuestionKind::Scale) {
            answers
                .entry(q.id.clone())
                .or_insert(AnswerValue::Number(SCALE_DEFAULT));
        }
        Ok((member_id, answers))
    }

    pub fn reset(&mut self) {
        self.member_id = None;
        self.answers.clear();
    }
}

/// Tasks for the schedule optimizer, one per non-blank line.
pub fn parse_tasks(input: &str) -> Result<Vec<String>> {
    let tasks: Vec<String> = input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if tasks.is_empty() {
        return Err(ClientError::validation("Add at least one task"));
    }
    Ok(tasks)
}
