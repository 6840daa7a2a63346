use anyhow::{Context, Result};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info};
use webuntis_api::class::{Class, ClassClient};
use webuntis_api::client::Client;
use webuntis_api::services::untis_service::UntisService;
use webuntis_api::student::StudentClient;
use webuntis_api::types::DateRange;

use crate::aggregate::{StudentSummary, TardinessRule, summarize};
use crate::report::ReportTable;

pub mod aggregate;
pub mod report;

/// Builds the report for every student of `class`. Students are fetched one after another, and
/// the first failure aborts the whole report.
#[tracing::instrument(skip(untis, class, rule), fields(%class))]
pub async fn class_report<Service: UntisService>(
    untis: &Client<Service>,
    class: &Class,
    window: &DateRange,
    rule: &impl TardinessRule,
) -> Result<ReportTable> {
    let class_client = ClassClient::new(untis, class);

    let students = class_client
        .students()
        .await
        .with_context(|| format!("could not get students of class {class}"))?;
    info!(count = students.len(), %window, "loading absences, this may take a moment");

    let summaries: Vec<StudentSummary> = stream::iter(&students)
        .then(|student| student_summary(class_client.with_student(student), window, rule))
        .try_collect()
        .await?;

    Ok(ReportTable::new(class, summaries))
}

pub async fn student_summary<Service: UntisService>(
    student_client: StudentClient<'_, Service>,
    window: &DateRange,
    rule: &impl TardinessRule,
) -> Result<StudentSummary> {
    let student = student_client.student();
    let name = student.full_name();

    let absences = student_client
        .absences(window)
        .await
        .with_context(|| format!("could not get absences of {name}"))?;
    let events = student_client
        .events(window)
        .await
        .with_context(|| format!("could not get class register entries of {name}"))?;

    let summary = summarize(name, &absences, &events, rule);
    debug!(?summary, absences = absences.len(), events = events.len(), "summarized student");

    Ok(summary)
}
