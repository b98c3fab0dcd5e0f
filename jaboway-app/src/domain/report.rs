use super::post::Post;
use super::thread::Thread;
use jaboway_errors::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum ReportReason {
    Spam,
    #[serde(rename = "Konten Tidak Pantas")]
    KontenTidakPantas,
    #[serde(rename = "Informasi Salah")]
    InformasiSalah,
    Lainnya(String),
}

impl ReportReason {
    pub fn validate(self) -> Result<Self, AppError> {
        match self {
            Self::Lainnya(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(AppError::validation("Jelaskan alasan laporan Anda."));
                }
                Ok(Self::Lainnya(text.to_string()))
            }
            other => Ok(other),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Spam => "Spam",
            Self::KontenTidakPantas => "Konten Tidak Pantas",
            Self::InformasiSalah => "Informasi Salah",
            Self::Lainnya(text) => text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ThreadReportOutcome {
    Reported { thread: Box<Thread> },
    AlreadyReported,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PostReportOutcome {
    Reported { post: Box<Post> },
    AlreadyReported,
    /// The report crossed the threshold and the post was removed.
    AutoRemoved { post_id: uuid::Uuid },
    /// The threshold was crossed on a post that must stay: the only post left,
    /// or the opening post while replies exist.
    RemovalBlocked { post: Box<Post> },
}

impl PostReportOutcome {
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Reported { .. } | Self::RemovalBlocked { .. } => "Terima kasih atas laporan Anda.",
            Self::AlreadyReported => "Anda sudah melaporkan komentar ini.",
            Self::AutoRemoved { .. } => {
                "Komentar telah dihapus secara otomatis karena melebihi batas laporan."
            }
        }
    }
}

impl ThreadReportOutcome {
    pub fn notice(&self) -> &'static str {
        match self {
            Self::Reported { .. } => "Terima kasih atas laporan Anda. Admin akan meninjaunya.",
            Self::AlreadyReported => "Anda sudah melaporkan diskusi ini.",
        }
    }
}
