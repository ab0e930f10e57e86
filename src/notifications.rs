//! Result notifications.
//!
//! A finalized test produces one notification for the client and one for the
//! referral contact, if the client has one. Delivery goes through the
//! [`Notifier`] seam; failures become `NotificationAlert` rows for staff.

use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::enums::RecipientKind;
use crate::models::{Client, DrugTest, NotificationAlert};
use crate::screening::{build_report, ConfirmationOutcome, ReportContext, TestReport};

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("No address on file for {0}")]
    NoAddress(String),
}

/// One outbound result message.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub drug_test_id: Uuid,
    pub recipient_kind: RecipientKind,
    pub recipient_name: String,
    pub address: Option<String>,
    pub report: TestReport,
}

/// Delivery channel. Implementations must be usable from request handlers.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let address = notification
            .address
            .as_deref()
            .ok_or_else(|| NotificationError::NoAddress(notification.recipient_name.clone()))?;
        tracing::info!(
            test_id = %notification.drug_test_id,
            recipient = notification.recipient_kind.as_str(),
            address,
            headline = %notification.report.headline,
            "Result notification sent"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Build the notifications for a finalized test.
pub fn route_notifications(
    client: &Client,
    test: &DrugTest,
    outcome: &ConfirmationOutcome,
) -> Vec<Notification> {
    let ctx = ReportContext {
        drug_test_id: test.id,
        client_name: &client.name,
        collection_date: test.collection_date,
        test_type: test.test_type,
    };

    let mut out = vec![Notification {
        drug_test_id: test.id,
        recipient_kind: RecipientKind::Client,
        recipient_name: client.name.clone(),
        address: client.email.clone(),
        report: build_report(&ctx, outcome, RecipientKind::Client),
    }];

    if let Some(referral) = &client.referral {
        out.push(Notification {
            drug_test_id: test.id,
            recipient_kind: RecipientKind::Referral,
            recipient_name: referral.name.clone(),
            address: Some(referral.email.clone()),
            report: build_report(&ctx, outcome, RecipientKind::Referral),
        });
    }
    out
}

/// Send every notification, recording each failure as an alert.
///
/// Delivery errors never propagate; only a failure to write the alert does.
pub fn dispatch(
    conn: &Connection,
    notifier: &dyn Notifier,
    notifications: &[Notification],
) -> Result<DispatchSummary, DatabaseError> {
    let mut summary = DispatchSummary::default();

    for notification in notifications {
        let result = match notification.address {
            Some(_) => notifier.send(notification),
            None => Err(NotificationError::NoAddress(notification.recipient_name.clone())),
        };

        match result {
            Ok(()) => summary.delivered += 1,
            Err(e) => {
                tracing::error!(
                    test_id = %notification.drug_test_id,
                    recipient = notification.recipient_kind.as_str(),
                    error = %e,
                    "Result notification failed"
                );
                db::insert_notification_alert(
                    conn,
                    &NotificationAlert {
                        id: Uuid::new_v4(),
                        drug_test_id: notification.drug_test_id,
                        recipient_kind: notification.recipient_kind,
                        recipient: notification
                            .address
                            .clone()
                            .unwrap_or_else(|| notification.recipient_name.clone()),
                        error: e.to_string(),
                        created_at: db::now(),
                        resolved: false,
                    },
                )?;
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
