//! When steps for job progress BDD scenarios.

use super::world::{JobProgressWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use svb::job::domain::JobStatus;

#[when("{completed:u32} pieces are recorded as completed")]
fn record_pieces(world: &mut JobProgressWorld, completed: u32) -> Result<(), eyre::Report> {
    let job = world.current_job()?;
    let (id, total) = (job.id(), job.total_pieces());
    let result = run_async(world.service.update_progress(id, completed, total));
    world.record(result);
    Ok(())
}

#[when(r#"the job is moved to "{status}""#)]
fn move_job(world: &mut JobProgressWorld, status: String) -> Result<(), eyre::Report> {
    let next = JobStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let id = world.current_job()?.id();
    let result = run_async(world.service.update_status(id, next));
    world.record(result);
    Ok(())
}

#[when("the admin board records {completed:u32} completed pieces")]
fn admin_records_pieces(world: &mut JobProgressWorld, completed: u32) -> Result<(), eyre::Report> {
    let id = world.current_job()?.id();
    run_async(world.admin.refresh()).wrap_err("load admin list")?;
    let saved = run_async(world.admin.commit_progress(id, completed))
        .wrap_err("commit progress from admin board")?;
    world.current = Some(saved);
    Ok(())
}
