//! User-facing reply text
//!
//! Every outcome maps to exactly one reply. Summaries use Telegram's legacy
//! Markdown; everything else is plain text.

use crate::models::format_rupiah;
use crate::pipeline::{Outcome, UpstreamFailure};
use crate::sheets::StoreError;
use crate::summary::{AllTimeSummaryOutcome, DailySummaryOutcome};
use crate::telegram::ParseMode;

pub const UNAUTHORIZED: &str = "Maaf, Anda tidak berwenang untuk menggunakan fitur ini.";
pub const INTERNAL_ERROR: &str = "Maaf, terjadi kesalahan internal.";

const AI_SLOW: &str = "Maaf, koneksi ke AI sedang lambat. Coba lagi sebentar.";
const AI_UNREACHABLE: &str = "Maaf, terjadi masalah saat menghubungi AI.";
const AI_MALFORMED: &str = "Maaf, terjadi masalah saat memproses respons dari AI.";
const EXTRACTION_FAILED: &str = "Maaf, saya tidak bisa mengekstrak informasi transaksi dari pesan Anda. Coba format yang berbeda?";
const SHEET_SLOW: &str = "Maaf, koneksi ke Google Sheets sedang lambat. Coba lagi sebentar.";
const SHEET_UNREADABLE: &str =
    "Maaf, terjadi masalah saat mengambil atau memproses data dari Google Sheets.";
const UNKNOWN_RESPONSE: &str = "Format respons tidak dikenali.";

pub const HELP: &str = "Halo! Kirim deskripsi transaksi dan saya akan mencatatnya ke Google Sheets.\n\
\n\
Contoh:\n\
25K nasi goreng via ShopeePay\n\
Ambil uang dari atm 500000\n\
\n\
Perintah:\n\
/harian - ringkasan pengeluaran hari ini\n\
/sisa_cash - ringkasan keuangan sepanjang waktu";

/// A reply ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: Some(ParseMode::Markdown),
        }
    }
}

/// Reply for a pipeline outcome
pub fn outcome(outcome: &Outcome) -> Reply {
    let text = match outcome {
        Outcome::Unauthorized => UNAUTHORIZED.to_string(),
        Outcome::UpstreamUnavailable(UpstreamFailure::Timeout) => AI_SLOW.to_string(),
        Outcome::UpstreamUnavailable(_) => AI_UNREACHABLE.to_string(),
        Outcome::UpstreamMalformed => AI_MALFORMED.to_string(),
        Outcome::ExtractionFailed => EXTRACTION_FAILED.to_string(),
        Outcome::ValidationFailed(reason) => format!(
            "⚠️ Jumlah pengeluaran ('amount') tidak terdeteksi atau tidak valid ({}). Data tidak disimpan.",
            reason.offending_value()
        ),
        Outcome::PersistedOk(record) => format!(
            "✅ Data {} - {} ({}) berhasil dicatat!",
            record.category_label(),
            record.description_label(),
            record.amount.as_number()
        ),
        Outcome::PersistedFailed(record) => format!(
            "⚠️ Data {} - {} ({}) berhasil diekstrak, TAPI GAGAL disimpan ke Google Sheets. Mohon periksa log atau coba lagi nanti.",
            record.category_label(),
            record.description_label(),
            record.amount.as_number()
        ),
        Outcome::InternalError => INTERNAL_ERROR.to_string(),
    };
    Reply::plain(text)
}

/// Reply for a daily summary
pub fn daily(outcome: &DailySummaryOutcome) -> Reply {
    match outcome {
        DailySummaryOutcome::Report(summary) => {
            let date = summary.date.format("%Y-%m-%d");
            let mut lines = vec![format!(
                "🧾 *Ringkasan Pengeluaran Hari Ini ({})* 🧾\n",
                date
            )];
            for (i, item) in summary.items.iter().enumerate() {
                lines.push(format!(
                    "{}. {} ({}/{}) - {}",
                    i + 1,
                    escape_markdown(&item.description),
                    escape_markdown(&item.category),
                    escape_markdown(&item.payment_method),
                    format_rupiah(item.amount)
                ));
            }
            lines.push(format!(
                "\n*Total Hari Ini: {}*",
                format_rupiah(summary.total)
            ));
            Reply::markdown(lines.join("\n"))
        }
        DailySummaryOutcome::Empty { date } => Reply::plain(format!(
            "Belum ada pengeluaran yang tercatat untuk hari ini ({}).",
            date.format("%Y-%m-%d")
        )),
        DailySummaryOutcome::Failed(e) => store_failure(e),
    }
}

/// Reply for the all-time summary
pub fn all_time(outcome: &AllTimeSummaryOutcome) -> Reply {
    match outcome {
        AllTimeSummaryOutcome::Report(summary) => {
            // A negative difference means income exceeds expenses; show the magnitude.
            let lines = [
                "📊 *Ringkasan Keuangan Sepanjang Waktu* 📊\n".to_string(),
                format!("💰 Total Pemasukan: {}", format_rupiah(summary.total_income)),
                format!("💸 Total Pengeluaran: {}", format_rupiah(summary.total_expense)),
                format!(
                    "🏦 Sisa Cash: {}",
                    format_rupiah(summary.expense_minus_income.abs())
                ),
            ];
            Reply::markdown(lines.join("\n"))
        }
        AllTimeSummaryOutcome::Failed(e) => store_failure(e),
    }
}

fn store_failure(e: &StoreError) -> Reply {
    let text = match e {
        StoreError::Timeout => SHEET_SLOW.to_string(),
        StoreError::Rejected(message) => format!(
            "Gagal mengambil data: {}",
            message.as_deref().unwrap_or(UNKNOWN_RESPONSE)
        ),
        StoreError::Transport(_)
        | StoreError::Status(_)
        | StoreError::Decode(_)
        | StoreError::Shape(_) => SHEET_UNREADABLE.to_string(),
    };
    Reply::plain(text)
}

/// Escape characters that legacy Markdown treats as entity delimiters
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
