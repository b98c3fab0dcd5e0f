use super::actor::{ActorContext, ADMIN_DISPLAY_NAME};
use jaboway_errors::AppError;
use serde::{Deserialize, Serialize};

pub const GUIDES_PER_PAGE: usize = 9;
const EMPTY_FIELD: &str = "—";
const ANONYMOUS_AUTHOR: &str = "Anonim";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Jakarta,
    Bogor,
    Depok,
    Tangerang,
    Bekasi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuideCategory {
    Transport,
    Wisata,
    Belanja,
    Kuliner,
    Umum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Pemula,
    Menengah,
    Ahli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideStatus {
    Pending,
    Approved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub id: uuid::Uuid,
    pub title: String,
    pub author: String,
    pub profile_id: Option<uuid::Uuid>,
    pub cities: Vec<City>,
    pub category: GuideCategory,
    pub difficulty: Difficulty,
    pub duration: String,
    pub cost: String,
    pub steps: Vec<String>,
    pub tips: Vec<String>,
    pub status: GuideStatus,
    pub views: u64,
    pub is_user_contribution: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Guide {
    pub fn is_approved(&self) -> bool {
        self.status == GuideStatus::Approved
    }

    pub fn is_admin_authored(&self) -> bool {
        !self.is_user_contribution || self.author == ADMIN_DISPLAY_NAME
    }

    pub fn matches(&self, filter: &GuideFilter) -> bool {
        if let Some(city) = filter.city {
            if !self.cities.contains(&city) {
                return false;
            }
        }
        if let Some(category) = filter.category {
            if self.category != category {
                return false;
            }
        }
        match filter.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => {
                let query = query.to_lowercase();
                self.title.to_lowercase().contains(&query)
                    || self.steps.join(" ").to_lowercase().contains(&query)
            }
            _ => true,
        }
    }

    /// Apply an edited contribution form on top of this guide.
    pub fn apply_edit(&mut self, content: &GuideContent) {
        self.title = content.title.clone();
        self.cities = content.cities.clone();
        self.category = content.category;
        self.cost = content.cost.clone();
        self.steps = content.steps.clone();
        self.tips = content.tips.clone();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideFilter {
    pub city: Option<City>,
    pub category: Option<GuideCategory>,
    pub query: Option<String>,
}

/// Window over the approved listing, never smaller than one page of [`GUIDES_PER_PAGE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub visible: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            visible: GUIDES_PER_PAGE,
        }
    }
}

impl PageWindow {
    pub fn new(visible: usize) -> Self {
        Self {
            visible: visible.max(GUIDES_PER_PAGE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidePage {
    pub guides: Vec<Guide>,
    pub total: usize,
    pub has_more: bool,
}

/// The contribution form as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuideDraft {
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub cities: Vec<City>,
    pub category: Option<GuideCategory>,
    pub steps_text: String,
    #[serde(default)]
    pub tips_text: String,
    #[serde(default)]
    pub cost: String,
}

/// Validated, normalised guide content ready to be written.
///
/// Authorship is resolved here but only written on insert; edits never
/// reassign a guide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuideContent {
    pub title: String,
    #[serde(skip)]
    pub author: String,
    #[serde(skip)]
    pub profile_id: Option<uuid::Uuid>,
    pub cities: Vec<City>,
    pub category: GuideCategory,
    pub cost: String,
    pub steps: Vec<String>,
    pub tips: Vec<String>,
}

impl GuideDraft {
    pub fn validate(&self, actor: &ActorContext) -> Result<GuideContent, AppError> {
        let typed_author = self.author.trim();
        let author_given = !typed_author.is_empty() || actor.is_signed_in() || actor.is_admin;
        if self.title.trim().is_empty()
            || self.steps_text.trim().is_empty()
            || !author_given
            || self.cities.is_empty()
        {
            return Err(AppError::validation(
                "Mohon isi semua kolom yang wajib diisi (Judul, Nama, Kota, dan Langkah-langkah).",
            ));
        }

        let (author, profile_id) = match (&actor.account, actor.is_admin) {
            (_, true) => (ADMIN_DISPLAY_NAME.to_string(), actor.account_id()),
            (Some(profile), false) => (profile.display_name.clone(), Some(profile.id)),
            (None, false) => (typed_author.to_string(), None),
        };

        let mut cities = Vec::with_capacity(self.cities.len());
        for city in &self.cities {
            if !cities.contains(city) {
                cities.push(*city);
            }
        }

        let cost = self.cost.trim();
        Ok(GuideContent {
            title: self.title.trim().to_string(),
            author: if author.is_empty() {
                ANONYMOUS_AUTHOR.to_string()
            } else {
                author
            },
            profile_id,
            cities,
            category: self.category.unwrap_or(GuideCategory::Transport),
            cost: if cost.is_empty() {
                EMPTY_FIELD.to_string()
            } else {
                cost.to_string()
            },
            steps: split_lines(&self.steps_text),
            tips: split_lines(&self.tips_text),
        })
    }
}

/// Fields written when a new guide is inserted.
#[derive(Debug, Clone, Serialize)]
pub struct NewGuide {
    #[serde(flatten)]
    pub content: GuideContent,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<uuid::Uuid>,
    pub difficulty: Difficulty,
    pub duration: String,
    pub is_user_contribution: bool,
    pub views: u64,
    pub status: GuideStatus,
}

impl NewGuide {
    /// Admin-created guides are published immediately; everything else waits for review.
    pub fn new(content: GuideContent, acting_as_admin: bool) -> Self {
        Self {
            author: content.author.clone(),
            profile_id: content.profile_id,
            content,
            difficulty: Difficulty::Pemula,
            duration: EMPTY_FIELD.to_string(),
            is_user_contribution: !acting_as_admin,
            views: 0,
            status: if acting_as_admin {
                GuideStatus::Approved
            } else {
                GuideStatus::Pending
            },
        }
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::{ActorId, Profile};

    fn guide(title: &str, steps: &[&str], cities: &[City]) -> Guide {
        Guide {
            id: uuid::Uuid::new_v4(),
            title: title.to_string(),
            author: "Rina".to_string(),
            profile_id: None,
            cities: cities.to_vec(),
            category: GuideCategory::Transport,
            difficulty: Difficulty::Pemula,
            duration: "—".to_string(),
            cost: "Rp 5.000".to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            tips: Vec::new(),
            status: GuideStatus::Approved,
            views: 0,
            is_user_contribution: true,
            created_at: None,
        }
    }

    fn draft() -> GuideDraft {
        GuideDraft {
            title: " Naik KRL ke Bogor ".to_string(),
            author: "Rina".to_string(),
            cities: vec![City::Jakarta, City::Bogor, City::Jakarta],
            category: None,
            steps_text: "Tap kartu\n\n  Naik dari Manggarai \n".to_string(),
            tips_text: String::new(),
            cost: "  ".to_string(),
        }
    }

    #[test]
    fn test_filter_matches_title_and_steps_case_insensitive() {
        let g = guide("Naik KRL", &["Tap kartu di gate", "Turun di MONAS"], &[City::Jakarta]);
        let by_step = GuideFilter {
            query: Some("monas".to_string()),
            ..Default::default()
        };
        let by_title = GuideFilter {
            query: Some("krl".to_string()),
            ..Default::default()
        };
        let miss = GuideFilter {
            query: Some("ragunan".to_string()),
            ..Default::default()
        };
        assert!(g.matches(&by_step));
        assert!(g.matches(&by_title));
        assert!(!g.matches(&miss));
    }

    #[test]
    fn test_filter_by_city_and_category() {
        let g = guide("Naik KRL", &["Tap"], &[City::Depok]);
        let depok = GuideFilter {
            city: Some(City::Depok),
            category: Some(GuideCategory::Transport),
            query: None,
        };
        let bekasi = GuideFilter {
            city: Some(City::Bekasi),
            ..Default::default()
        };
        assert!(g.matches(&depok));
        assert!(!g.matches(&bekasi));
    }

    #[test]
    fn test_draft_normalisation() {
        let actor = ActorContext::guest(ActorId::generate_guest());
        let content = draft().validate(&actor).unwrap();
        assert_eq!(content.title, "Naik KRL ke Bogor");
        assert_eq!(content.cities, vec![City::Jakarta, City::Bogor]);
        assert_eq!(content.steps, vec!["Tap kartu", "Naik dari Manggarai"]);
        assert!(content.tips.is_empty());
        assert_eq!(content.cost, "—");
        assert_eq!(content.category, GuideCategory::Transport);
        assert_eq!(content.author, "Rina");
    }

    #[test]
    fn test_draft_requires_fields() {
        let actor = ActorContext::guest(ActorId::generate_guest());
        let mut d = draft();
        d.cities.clear();
        assert!(matches!(d.validate(&actor), Err(AppError::Validation(_))));
        let mut d = draft();
        d.steps_text = "   ".to_string();
        assert!(d.validate(&actor).is_err());
        let mut d = draft();
        d.author = String::new();
        assert!(d.validate(&actor).is_err());
    }

    #[test]
    fn test_signed_in_author_is_stamped_from_profile() {
        let profile = Profile {
            id: uuid::Uuid::new_v4(),
            display_name: "Budi".to_string(),
            is_blocked: false,
        };
        let actor = ActorContext::account(profile.clone());
        let mut d = draft();
        d.author = String::new();
        let content = d.validate(&actor).unwrap();
        assert_eq!(content.author, "Budi");
        assert_eq!(content.profile_id, Some(profile.id));
    }

    #[test]
    fn test_new_guide_status_follows_admin_flag() {
        let actor = ActorContext::guest(ActorId::generate_guest());
        let content = draft().validate(&actor).unwrap();
        let pending = NewGuide::new(content.clone(), false);
        assert_eq!(pending.status, GuideStatus::Pending);
        assert!(pending.is_user_contribution);
        let approved = NewGuide::new(content, true);
        assert_eq!(approved.status, GuideStatus::Approved);
        assert!(!approved.is_user_contribution);
    }

    #[test]
    fn test_page_window_never_shrinks_below_a_page() {
        let window = PageWindow::default();
        assert_eq!(window.visible, GUIDES_PER_PAGE);
        assert_eq!(PageWindow::new(GUIDES_PER_PAGE * 3).visible, 27);
        assert_eq!(PageWindow::new(0).visible, GUIDES_PER_PAGE);
    }
}
