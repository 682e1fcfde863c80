//! Canonical status vocabularies.
//!
//! The transactional stores evolved independently: orders carry legacy
//! Korean labels, stringing applications short English codes, package
//! orders the newer enum spelling. Everything funnels through these
//! equivalence sets so no aggregator ever string-matches a raw label.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Other,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelStatus {
    None,
    Requested,
    Approved,
    Rejected,
}

impl CancelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

pub const PAID_LABELS: &[&str] = &[
    "paid",
    "payment_completed",
    "deposit_confirmed",
    "결제완료",
    "입금확인",
];

pub const PENDING_LABELS: &[&str] = &[
    "pending",
    "awaiting_payment",
    "awaiting_deposit",
    "unpaid",
    "결제대기",
    "입금대기",
];

pub const CANCEL_REQUESTED_LABELS: &[&str] = &["requested", "cancel_requested", "취소요청"];

pub const CANCEL_APPROVED_LABELS: &[&str] =
    &["approved", "cancel_approved", "cancelled", "취소완료"];

pub const CANCEL_REJECTED_LABELS: &[&str] = &["rejected", "cancel_rejected", "취소거절"];

fn canon(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Collapse a raw payment label into the canonical vocabulary. Unknown
/// labels become `Other`; this is a normalization layer, not a
/// validator. Normalizing an already-canonical value is the identity.
pub fn normalize_payment(raw: &str) -> PaymentStatus {
    let normalized = canon(raw);
    if PAID_LABELS.contains(&normalized.as_str()) {
        return PaymentStatus::Paid;
    }
    if PENDING_LABELS.contains(&normalized.as_str()) {
        return PaymentStatus::Pending;
    }
    PaymentStatus::Other
}

/// Collapse a raw cancellation label. Absent or unknown labels become
/// `None`; most records were never cancelled.
pub fn normalize_cancel(raw: &str) -> CancelStatus {
    let normalized = canon(raw);
    if normalized.is_empty() || normalized == "none" {
        return CancelStatus::None;
    }
    if CANCEL_REQUESTED_LABELS.contains(&normalized.as_str()) {
        return CancelStatus::Requested;
    }
    if CANCEL_APPROVED_LABELS.contains(&normalized.as_str()) {
        return CancelStatus::Approved;
    }
    if CANCEL_REJECTED_LABELS.contains(&normalized.as_str()) {
        return CancelStatus::Rejected;
    }
    CancelStatus::None
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_cancel, normalize_payment, CancelStatus, PaymentStatus, CANCEL_APPROVED_LABELS,
        CANCEL_REJECTED_LABELS, CANCEL_REQUESTED_LABELS, PAID_LABELS, PENDING_LABELS,
    };

    #[test]
    fn equivalence_classes_collapse_to_one_value() {
        for label in PAID_LABELS {
            assert_eq!(normalize_payment(label), PaymentStatus::Paid, "{label}");
        }
        for label in PENDING_LABELS {
            assert_eq!(normalize_payment(label), PaymentStatus::Pending, "{label}");
        }
        for label in CANCEL_REQUESTED_LABELS {
            assert_eq!(normalize_cancel(label), CancelStatus::Requested, "{label}");
        }
        for label in CANCEL_APPROVED_LABELS {
            assert_eq!(normalize_cancel(label), CancelStatus::Approved, "{label}");
        }
        for label in CANCEL_REJECTED_LABELS {
            assert_eq!(normalize_cancel(label), CancelStatus::Rejected, "{label}");
        }
    }

    #[test]
    fn tolerates_case_and_whitespace() {
        assert_eq!(normalize_payment("  PAID "), PaymentStatus::Paid);
        assert_eq!(normalize_payment("Awaiting_Payment"), PaymentStatus::Pending);
        assert_eq!(normalize_cancel(" Cancel_Requested"), CancelStatus::Requested);
    }

    #[test]
    fn unknown_labels_never_throw() {
        assert_eq!(normalize_payment("refund_in_progress"), PaymentStatus::Other);
        assert_eq!(normalize_payment(""), PaymentStatus::Other);
        assert_eq!(normalize_cancel("definitely_new_state"), CancelStatus::None);
        assert_eq!(normalize_cancel(""), CancelStatus::None);
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["paid", "결제완료", "unpaid", "whatever", ""] {
            let once = normalize_payment(raw);
            assert_eq!(normalize_payment(once.as_str()), once);
        }
        for raw in ["cancel_requested", "취소완료", "rejected", "", "unknown"] {
            let once = normalize_cancel(raw);
            assert_eq!(normalize_cancel(once.as_str()), once);
        }
    }
}
