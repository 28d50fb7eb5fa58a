//! Metric definitions

use metrics::{counter, describe_counter};

/// Register metric descriptions and emit initial zero values so a recorder
/// reports every series from startup.
pub fn describe_metrics() {
    describe_counter!(
        "mailer_emails_sent_total",
        "Total number of emails accepted by the delivery backend"
    );
    describe_counter!(
        "mailer_emails_failed_total",
        "Total number of emails that failed to send"
    );
    describe_counter!(
        "mailer_bulk_batches_total",
        "Total number of bulk send invocations by outcome"
    );

    for provider in ["cloud", "smtp"] {
        counter!("mailer_emails_sent_total", "provider" => provider).absolute(0);
    }
    counter!("mailer_bulk_batches_total", "outcome" => "complete").absolute(0);
}
