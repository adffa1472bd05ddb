use crate::ctx::Ctx;
use crate::output::{opt, print_json, print_table};
use academy_core::progress;
use anyhow::Context;
use serde_json::json;
use std::path::PathBuf;

pub fn curriculum(ctx: &Ctx) -> anyhow::Result<()> {
    ctx.require_session()?;
    let mut modules = ctx
        .block_on(ctx.client.curriculum())
        .context("failed to load curriculum")?;
    modules.sort_by_key(|m| (m.order, m.id));
    if ctx.json {
        return print_json(&modules);
    }

    let rows = modules
        .iter()
        .map(|m| {
            vec![
                m.order.to_string(),
                m.title.clone(),
                if m.completed { "done" } else { "" }.to_string(),
            ]
        })
        .collect();
    print_table(&["#", "MODULE", "STATUS"], rows, "No modules yet.");
    Ok(())
}

pub fn assignments(ctx: &Ctx) -> anyhow::Result<()> {
    ctx.require_session()?;
    let assignments = ctx
        .block_on(ctx.client.assignments())
        .context("failed to load assignments")?;
    if ctx.json {
        return print_json(&assignments);
    }

    let rows = assignments
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.title.clone(),
                opt(a.due_date.map(|d| d.date_naive())),
                opt(a.max_score),
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "DUE", "MAX"], rows, "No assignments.");
    Ok(())
}

pub fn submit(
    ctx: &Ctx,
    assignment_id: u64,
    content: Option<String>,
    file: Option<PathBuf>,
) -> anyhow::Result<()> {
    ctx.require_session()?;
    let content = match (content, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        (None, None) => anyhow::bail!("nothing to submit: pass --content or --file"),
    };
    if content.trim().is_empty() {
        anyhow::bail!("submission is empty");
    }

    let submission = ctx
        .block_on(ctx.client.submit_assignment(assignment_id, &content))
        .with_context(|| format!("failed to submit assignment {assignment_id}"))?;
    if ctx.json {
        return print_json(&submission);
    }
    println!(
        "Submitted assignment {assignment_id} (submission {})",
        submission.id
    );
    Ok(())
}

pub fn attendance(ctx: &Ctx) -> anyhow::Result<()> {
    ctx.require_session()?;
    let records = ctx
        .block_on(ctx.client.attendance())
        .context("failed to load attendance")?;
    if ctx.json {
        return print_json(&records);
    }

    let rows = records
        .iter()
        .map(|r| {
            vec![
                opt(r.session_date),
                format!("{:?}", r.status).to_lowercase(),
            ]
        })
        .collect();
    print_table(&["DATE", "STATUS"], rows, "No sessions recorded.");
    Ok(())
}

pub fn certificates(ctx: &Ctx) -> anyhow::Result<()> {
    ctx.require_session()?;
    let certs = ctx
        .block_on(ctx.client.certificates())
        .context("failed to load certificates")?;
    if ctx.json {
        return print_json(&certs);
    }

    let rows = certs
        .iter()
        .map(|c| {
            vec![
                c.title.clone(),
                opt(c.issued_at.map(|d| d.date_naive())),
                opt(c.url.as_deref()),
            ]
        })
        .collect();
    print_table(&["CERTIFICATE", "ISSUED", "URL"], rows, "No certificates yet.");
    Ok(())
}

/// Fetches the three collections concurrently, then summarises them.
pub fn progress(ctx: &Ctx) -> anyhow::Result<()> {
    ctx.require_session()?;
    let client = &ctx.client;
    let (modules, submissions, records) = ctx.block_on(async {
        tokio::try_join!(
            client.curriculum(),
            client.my_submissions(),
            client.attendance()
        )
    })
    .context("failed to load progress")?;

    let completion = progress::completion_percent(&modules);
    let average = progress::grade_average(&submissions);
    let attendance = progress::attendance_rate(&records);

    if ctx.json {
        return print_json(&json!({
            "completion_percent": completion,
            "grade_average": average,
            "attendance_percent": attendance,
        }));
    }
    println!("Curriculum  {completion}%");
    println!(
        "Grades      {}",
        average.map_or_else(|| "not graded yet".to_string(), |a| format!("{a:.1}"))
    );
    println!("Attendance  {attendance}%");
    Ok(())
}
