use crate::ctx::Ctx;
use crate::output::{opt, print_json, print_table};
use academy_core::types::{Grade, NewCohort};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminSubcommand {
    /// List enrolled students
    Students,
    /// List cohorts
    Cohorts,
    /// Create a cohort
    CreateCohort {
        name: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
    /// List submissions awaiting review
    Submissions,
    /// Grade a submission
    Grade {
        submission_id: u64,
        #[arg(long)]
        score: f64,
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Issue a certificate to a student
    Certify {
        student_id: u64,
        #[arg(long)]
        title: String,
    },
}

pub fn run(ctx: &Ctx, subcmd: AdminSubcommand) -> anyhow::Result<()> {
    ctx.require_session()?;
    match subcmd {
        AdminSubcommand::Students => students(ctx),
        AdminSubcommand::Cohorts => cohorts(ctx),
        AdminSubcommand::CreateCohort { name, start, end } => {
            create_cohort(ctx, name, start.as_deref(), end.as_deref())
        }
        AdminSubcommand::Submissions => submissions(ctx),
        AdminSubcommand::Grade {
            submission_id,
            score,
            feedback,
        } => grade(ctx, submission_id, score, feedback),
        AdminSubcommand::Certify { student_id, title } => certify(ctx, student_id, &title),
    }
}

fn students(ctx: &Ctx) -> anyhow::Result<()> {
    let students = ctx
        .block_on(ctx.client.students())
        .context("failed to load students")?;
    if ctx.json {
        return print_json(&students);
    }

    let rows = students
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.full_name.clone(),
                s.email.clone(),
                opt(s.cohort_id),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "EMAIL", "COHORT"], rows, "No students.");
    Ok(())
}

fn cohorts(ctx: &Ctx) -> anyhow::Result<()> {
    let cohorts = ctx
        .block_on(ctx.client.cohorts())
        .context("failed to load cohorts")?;
    if ctx.json {
        return print_json(&cohorts);
    }

    let rows = cohorts
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.name.clone(),
                opt(c.start_date),
                opt(c.end_date),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "START", "END"], rows, "No cohorts.");
    Ok(())
}

fn create_cohort(
    ctx: &Ctx,
    name: String,
    start: Option<&str>,
    end: Option<&str>,
) -> anyhow::Result<()> {
    let cohort = NewCohort {
        name,
        start_date: parse_date("start", start)?,
        end_date: parse_date("end", end)?,
    };

    let created = ctx
        .block_on(ctx.client.create_cohort(&cohort))
        .context("failed to create cohort")?;
    if ctx.json {
        return print_json(&created);
    }
    println!("Created cohort {} ({})", created.name, created.id);
    Ok(())
}

fn parse_date(label: &str, value: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .with_context(|| format!("invalid {label} date '{v}', expected YYYY-MM-DD"))
        })
        .transpose()
}

fn submissions(ctx: &Ctx) -> anyhow::Result<()> {
    let subs = ctx
        .block_on(ctx.client.submissions())
        .context("failed to load submissions")?;
    if ctx.json {
        return print_json(&subs);
    }

    let rows = subs
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.assignment_id.to_string(),
                opt(s.student_id),
                format!("{:?}", s.status).to_lowercase(),
                opt(s.score),
            ]
        })
        .collect();
    print_table(
        &["ID", "ASSIGNMENT", "STUDENT", "STATUS", "SCORE"],
        rows,
        "No submissions.",
    );
    Ok(())
}

fn grade(ctx: &Ctx, submission_id: u64, score: f64, feedback: Option<String>) -> anyhow::Result<()> {
    if !(0.0..=100.0).contains(&score) {
        anyhow::bail!("score must be between 0 and 100, got {score}");
    }
    let graded = ctx
        .block_on(
            ctx.client
                .grade_submission(submission_id, &Grade::new(score, feedback)),
        )
        .with_context(|| format!("failed to grade submission {submission_id}"))?;
    if ctx.json {
        return print_json(&graded);
    }
    println!("Graded submission {submission_id}: {}", opt(graded.score));
    Ok(())
}

fn certify(ctx: &Ctx, student_id: u64, title: &str) -> anyhow::Result<()> {
    let cert = ctx
        .block_on(ctx.client.issue_certificate(student_id, title))
        .with_context(|| format!("failed to issue certificate to student {student_id}"))?;
    if ctx.json {
        return print_json(&cert);
    }
    println!("Issued '{}' to student {student_id}", cert.title);
    Ok(())
}
