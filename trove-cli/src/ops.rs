//! One function per user command.
//!
//! Each operation opens its own connection, sends one request, decodes the
//! reply, updates the local workspace, and prints a confirmation. Server
//! errors come back typed and are reported by the caller.

use tracing::debug;
use trove_core::error::{Error, Result};
use trove_core::manifest::Manifest;
use trove_core::protocol::{decode_snapshot_reply, decode_version_reply, Request};

use crate::connection::Connection;
use crate::workspace::{ClientConfig, Workspace};

pub async fn create_project(workspace: &Workspace, addr: &str, project: &str) -> Result<()> {
    let frame = Connection::round_trip(
        addr,
        &Request::CreateProject {
            project: project.to_string(),
        },
    )
    .await?;
    let version = decode_version_reply(&frame)?;

    workspace.save_manifest(&Manifest::new(project))?;
    workspace.save_config(&ClientConfig {
        server_addr: addr.to_string(),
    })?;
    println!("Created project {project} at version {version}");
    Ok(())
}

pub async fn push(workspace: &Workspace, addr: &str) -> Result<()> {
    let before = workspace.manifest()?;
    let staged = workspace.stage_changes()?;
    // Persist staging markers before sending; if the push fails they stay
    // in place and `commit` can finish the job.
    workspace.save_manifest(&staged)?;
    let batch = workspace.staged_batch(&staged)?;
    let project = staged.project.clone();
    let changed = batch.len();
    debug!(project = %project, changed, "pushing");

    let frame = Connection::round_trip(
        addr,
        &Request::Push {
            project: project.clone(),
            batch,
        },
    )
    .await?;
    let version = decode_version_reply(&frame)?;
    workspace.apply_ack(&before, staged, version)?;

    if changed == 0 {
        println!("No local changes; {project} is now at version {version}");
    } else {
        println!("Pushed {changed} change(s); {project} is now at version {version}");
    }
    Ok(())
}

pub async fn commit(workspace: &Workspace, addr: &str) -> Result<()> {
    let staged = workspace.manifest()?;
    let batch = workspace.staged_batch(&staged)?;
    if batch.is_empty() {
        return Err(Error::NothingStaged(staged.project.clone()));
    }
    let project = staged.project.clone();
    let count = batch.len();
    debug!(project = %project, count, "committing staged changes");

    let frame = Connection::round_trip(
        addr,
        &Request::Commit {
            project: project.clone(),
            batch,
        },
    )
    .await?;
    let version = decode_version_reply(&frame)?;
    let before = staged.clone();
    workspace.apply_ack(&before, staged, version)?;

    println!("Committed {count} staged change(s); {project} is now at version {version}");
    Ok(())
}

pub async fn checkout(workspace: &Workspace, addr: &str, project: &str) -> Result<()> {
    let frame = Connection::round_trip(
        addr,
        &Request::Checkout {
            project: project.to_string(),
        },
    )
    .await?;
    let (manifest, contents) = decode_snapshot_reply(&frame)?;
    workspace.materialize(&manifest, &contents)?;
    workspace.save_config(&ClientConfig {
        server_addr: addr.to_string(),
    })?;

    println!(
        "Checked out {project} at version {} ({} file(s))",
        manifest.version,
        manifest.len()
    );
    Ok(())
}

pub async fn current_version(workspace: &Workspace, addr: &str, project: Option<&str>) -> Result<()> {
    let project = match project {
        Some(name) => name.to_string(),
        None => workspace.manifest()?.project,
    };
    let frame = Connection::round_trip(
        addr,
        &Request::GetCurrentVersion {
            project: project.clone(),
        },
    )
    .await?;
    let version = decode_version_reply(&frame)?;
    println!("{project} is at version {version}");
    Ok(())
}

pub async fn rollback(workspace: &Workspace, addr: &str) -> Result<()> {
    let project = workspace.manifest()?.project;
    let frame = Connection::round_trip(
        addr,
        &Request::Rollback {
            project: project.clone(),
        },
    )
    .await?;
    let version = decode_version_reply(&frame)?;

    // Mirror the server's previous-version policy with the local snapshot;
    // a workspace without one resynchronizes via checkout.
    if let Some(mut prev) = workspace.load_prev()? {
        if let Some(current) = workspace.try_manifest()? {
            workspace.snapshot_prev(&current)?;
        }
        prev.version = version;
        workspace.save_manifest(&prev)?;
    }

    println!("Rolled {project} back; now at version {version}");
    println!("Run `trove checkout {project}` to refresh the working tree");
    Ok(())
}
