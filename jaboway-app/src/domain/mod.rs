mod actor;
mod guide;
mod post;
mod report;
mod thread;

pub use actor::{ActorContext, ActorId, AuthUser, Profile, ADMIN_DISPLAY_NAME, GUEST_DISPLAY_NAME};
pub use guide::{
    City, Difficulty, Guide, GuideCategory, GuideContent, GuideDraft, GuideFilter, GuidePage,
    GuideStatus, NewGuide, PageWindow, GUIDES_PER_PAGE,
};
pub use post::{validate_post_text, Post, PostAuthor};
pub use report::{PostReportOutcome, ReportReason, ThreadReportOutcome};
pub use thread::{
    ReportLedger, Thread, ThreadCategory, ThreadForm, ThreadView, TrustStatus, VoteLedger,
    VoteTally, VoteType, REPORT_THRESHOLD,
};
