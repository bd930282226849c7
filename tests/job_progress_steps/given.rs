//! Given steps for job progress BDD scenarios.

use super::world::{JobProgressWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use svb::job::{domain::JobStatus, services::CreateJobRequest};

#[given(r#"a new job "{job_number}" for part "{part_number}" with {total:u32} pieces"#)]
fn new_job(
    world: &mut JobProgressWorld,
    job_number: String,
    part_number: String,
    total: u32,
) -> Result<(), eyre::Report> {
    let request = CreateJobRequest::new(job_number, part_number, total);
    let created = run_async(world.service.create_job(request))
        .wrap_err("create job for progress scenario")?;
    world.current = Some(created);
    Ok(())
}

#[given("{completed:u32} pieces were already completed")]
fn pieces_already_completed(
    world: &mut JobProgressWorld,
    completed: u32,
) -> Result<(), eyre::Report> {
    let job = world.current_job()?;
    let (id, total) = (job.id(), job.total_pieces());
    let updated = run_async(world.service.update_progress(id, completed, total))
        .wrap_err("record starting progress")?;
    world.current = Some(updated);
    Ok(())
}

#[given("the job was started")]
fn job_started(world: &mut JobProgressWorld) -> Result<(), eyre::Report> {
    let id = world.current_job()?.id();
    let started = run_async(world.service.update_status(id, JobStatus::InProgress))
        .wrap_err("start job")?;
    world.current = Some(started);
    Ok(())
}
