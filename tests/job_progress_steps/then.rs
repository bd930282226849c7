//! Then steps for job progress BDD scenarios.

use super::world::{JobProgressWorld, run_async};
use chrono::Utc;
use eyre::WrapErr;
use rstest_bdd_macros::then;
use svb::config::DisplaySettings;
use svb::display::{DisplaySynchronizer, InitialSnapshot};
use svb::job::domain::JobStatus;
use svb::job::ports::JobRepository;

#[then("the job shows {percentage:u8} percent complete")]
fn job_percentage(world: &JobProgressWorld, percentage: u8) -> Result<(), eyre::Report> {
    let id = world.current_job()?.id();
    let stored = run_async(world.service.find_job(id))
        .wrap_err("reload job")?
        .ok_or_else(|| eyre::eyre!("job {id} missing from store"))?;
    eyre::ensure!(
        stored.percentage() == percentage,
        "expected {percentage}%, found {}%",
        stored.percentage()
    );
    Ok(())
}

#[then(r#"the job status is "{status}""#)]
fn job_status(world: &JobProgressWorld, status: String) -> Result<(), eyre::Report> {
    let expected = JobStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let found = world.current_job()?.status();
    eyre::ensure!(found == expected, "expected status {expected}, found {found}");
    Ok(())
}

#[then(r#"the update is rejected with "{message}""#)]
fn rejected_with(world: &JobProgressWorld, message: String) -> Result<(), eyre::Report> {
    let error = world
        .last_error
        .as_deref()
        .ok_or_else(|| eyre::eyre!("expected the update to fail"))?;
    eyre::ensure!(error == message, "unexpected error message: {error}");
    Ok(())
}

#[then(r#"the update is rejected mentioning "{fragment}""#)]
fn rejected_mentioning(world: &JobProgressWorld, fragment: String) -> Result<(), eyre::Report> {
    let error = world
        .last_error
        .as_deref()
        .ok_or_else(|| eyre::eyre!("expected the update to fail"))?;
    eyre::ensure!(
        error.contains(&fragment),
        "error '{error}' does not mention '{fragment}'"
    );
    Ok(())
}

#[then(r#"the TV board lists "{job_number}" as "{status}""#)]
fn tv_board_lists(
    world: &JobProgressWorld,
    job_number: String,
    status: String,
) -> Result<(), eyre::Report> {
    let jobs = run_async(world.store.list_all()).wrap_err("list jobs for board")?;
    let now = Utc::now();
    let board =
        DisplaySynchronizer::new(DisplaySettings::default(), InitialSnapshot::loaded(jobs, now));
    let view = board.view(now);
    let listed = view
        .jobs
        .iter()
        .find(|job| job.job_number().as_str() == job_number)
        .ok_or_else(|| eyre::eyre!("{job_number} not on the board"))?;
    eyre::ensure!(
        listed.status().as_str() == status,
        "board shows {} for {job_number}",
        listed.status()
    );
    Ok(())
}
