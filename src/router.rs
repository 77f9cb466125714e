use std::fmt;
use std::str::FromStr;

use tokio::task::JoinHandle;

use crate::error::ClientError;

// ── Pages ───────────────────────────────────────────────────────────────────

macro_rules! pages {
    ($($variant:ident => $id:literal),+ $(,)?) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Page {
            $($variant),+
        }

        impl Page {
            pub const ALL: &'static [Page] = &[$(Page::$variant),+];

            pub fn id(self) -> &'static str {
                match self {
                    $(Page::$variant => $id),+
                }
            }
        }

        impl FromStr for Page {
            type Err = ClientError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($id => Ok(Page::$variant),)+
                    other => Err(ClientError::validation(format!("Unknown page: {other}"))),
                }
            }
        }
    };
}

pages! {
    Home => "home",
    Dashboard => "dashboard",
    Teams => "teams",
    MyTeam => "myteam",
    Team => "team",
    FindTeam => "find-team",
    Chat => "chat",
    Channels => "channels",
    Kanban => "kanban",
    Notes => "notes",
    SmartNotes => "smart-notes",
    Moodboard => "moodboard",
    PersonalChat => "personal-chat",
    Teacher => "teacher",
    Learn => "learn",
    Burnout => "burnout",
    Tournaments => "tournaments",
    Leaderboard => "leaderboard",
    Profile => "profile",
    AiInsights => "ai-insights",
    RoleTest => "role-test",
    HackathonCatalog => "hackathon-catalog",
    Project => "project",
    ProjectSpace => "project-space",
    Olympiad => "olympiad",
    Codespace => "codespace",
    SoloMode => "solo-mode",
    Tools => "tools",
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Pages reachable from the mobile bottom bar, in bar order.
pub const BOTTOM_NAV: [Page; 5] = [
    Page::PersonalChat,
    Page::Teams,
    Page::Learn,
    Page::Burnout,
    Page::Profile,
];

/// Data a page fetches the moment it becomes active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LazyLoad {
    Topics,
    BurnoutMembers,
    Tournaments,
    Leaderboard,
    Profile,
    UserSearch,
    PersonalHistory,
    Kanban,
    Dashboard,
    Channels,
    SmartNotes,
    Moodboards,
    Teams,
    Learn,
    Insights,
    RoleTest,
    Catalog,
    DailyChallenge,
    Roadmaps,
    Olympiad,
    Codespace,
    ProjectSpace,
    MyTeam,
}

impl Page {
    pub fn lazy_load(self) -> Option<LazyLoad> {
        let load = match self {
            Page::Teacher => LazyLoad::Topics,
            Page::Burnout => LazyLoad::BurnoutMembers,
            Page::Tournaments => LazyLoad::Tournaments,
            Page::Leaderboard => LazyLoad::Leaderboard,
            Page::Profile => LazyLoad::Profile,
            Page::FindTeam => LazyLoad::UserSearch,
            Page::PersonalChat => LazyLoad::PersonalHistory,
            Page::Kanban => LazyLoad::Kanban,
            Page::Dashboard => LazyLoad::Dashboard,
            Page::Channels => LazyLoad::Channels,
            Page::SmartNotes => LazyLoad::SmartNotes,
            Page::Moodboard => LazyLoad::Moodboards,
            Page::Teams => LazyLoad::Teams,
            Page::Learn => LazyLoad::Learn,
            Page::AiInsights => LazyLoad::Insights,
            Page::RoleTest => LazyLoad::RoleTest,
            Page::HackathonCatalog => LazyLoad::Catalog,
            Page::Home => LazyLoad::DailyChallenge,
            Page::Project => LazyLoad::Roadmaps,
            Page::Olympiad => LazyLoad::Olympiad,
            Page::Codespace => LazyLoad::Codespace,
            Page::ProjectSpace => LazyLoad::ProjectSpace,
            Page::MyTeam => LazyLoad::MyTeam,
            Page::Team | Page::Chat | Page::Notes | Page::SoloMode | Page::Tools => return None,
        };
        Some(load)
    }

    pub fn in_bottom_nav(self) -> bool {
        BOTTOM_NAV.contains(&self)
    }
}

// ── Router ──────────────────────────────────────────────────────────────────

/// Highlighted entry of each navigation surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavHighlight {
    pub sidebar: Option<Page>,
    pub drawer: Option<Page>,
    pub bottom: Option<Page>,
}

/// Which page is shown, plus the dashboard poll that lives only while the
/// dashboard is.
pub struct Router {
    active: Page,
    dashboard_poll: Option<JoinHandle<()>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            active: Page::Home,
            dashboard_poll: None,
        }
    }

    pub fn active(&self) -> Page {
        self.active
    }

    pub fn is_active(&self, page: Page) -> bool {
        self.active == page
    }

    /// Switch pages. Returns the lazy load the new page asks for.
    pub fn show(&mut self, page: Page) -> Option<LazyLoad> {
        if page != Page::Dashboard {
            self.cancel_dashboard_poll();
        }
        tracing::debug!("page {} → {}", self.active, page);
        self.active = page;
        page.lazy_load()
    }

    pub fn nav(&self) -> NavHighlight {
        NavHighlight {
            sidebar: Some(self.active),
            drawer: Some(self.active),
            bottom: self.active.in_bottom_nav().then_some(self.active),
        }
    }

    /// Install the dashboard poll, replacing (and stopping) any previous one.
    pub fn set_dashboard_poll(&mut self, handle: JoinHandle<()>) {
        self.cancel_dashboard_poll();
        self.dashboard_poll = Some(handle);
    }

    pub fn has_dashboard_poll(&self) -> bool {
        self.dashboard_poll
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub fn cancel_dashboard_poll(&mut self) {
        if let Some(handle) = self.dashboard_poll.take() {
            handle.abort();
            tracing::debug!("dashboard poll cancelled");
        }
    }
}

impl Drop for Router {
    fn drop(&mut self) {
        self.cancel_dashboard_poll();
    }
}
