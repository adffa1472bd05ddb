use crate::ctx::Ctx;
use crate::output::{opt, print_fields, print_json};
use academy_core::types::{AuthSession, LoginRequest, RegisterRequest};
use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand)]
pub enum PasswordSubcommand {
    /// Email a reset link
    Request {
        #[arg(long)]
        email: String,
    },
    /// Set a new password using the emailed token
    Confirm {
        #[arg(long)]
        token: String,
        #[arg(long = "new-password", env = "ACADEMY_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },
}

pub fn login(ctx: &Ctx, email: String, password: String) -> anyhow::Result<()> {
    let req = LoginRequest { email, password };
    ctx.quiet_session_hint();
    let session = ctx
        .block_on(ctx.client.login(&req))
        .context("login failed")?;
    report_session(ctx, &session, &req.email)
}

pub fn register(
    ctx: &Ctx,
    full_name: String,
    email: String,
    password: String,
    cohort_id: Option<u64>,
) -> anyhow::Result<()> {
    let req = RegisterRequest {
        full_name,
        email,
        password,
        cohort_id,
    };
    ctx.quiet_session_hint();
    let session = ctx
        .block_on(ctx.client.register(&req))
        .context("registration failed")?;
    report_session(ctx, &session, &req.email)
}

fn report_session(ctx: &Ctx, session: &AuthSession, email: &str) -> anyhow::Result<()> {
    let user = session.user.as_ref();
    if ctx.json {
        // Never echo the credential itself.
        return print_json(&json!({ "signed_in": true, "user": user }));
    }
    let name = user
        .map(|u| u.full_name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(email);
    println!("Signed in as {name}");
    Ok(())
}

pub fn logout(ctx: &Ctx) -> anyhow::Result<()> {
    ctx.block_on(ctx.client.logout())
        .context("failed to clear local session")?;
    if ctx.json {
        print_json(&json!({ "signed_in": false }))
    } else {
        println!("Signed out");
        Ok(())
    }
}

pub fn whoami(ctx: &Ctx) -> anyhow::Result<()> {
    ctx.require_session()?;
    let profile = ctx
        .block_on(ctx.client.profile())
        .context("failed to load profile")?;
    if ctx.json {
        return print_json(&profile);
    }

    let user = &profile.user;
    print_fields(&[
        ("name", user.full_name.clone()),
        ("email", user.email.clone()),
        ("role", user.role.to_string()),
        ("tier", opt(user.tier.as_deref())),
        ("cohort", opt(profile.cohort.as_ref().map(|c| c.name.as_str()))),
        ("enrollments", profile.enrollments.len().to_string()),
    ]);
    Ok(())
}

pub fn password(ctx: &Ctx, subcmd: PasswordSubcommand) -> anyhow::Result<()> {
    ctx.quiet_session_hint();
    match subcmd {
        PasswordSubcommand::Request { email } => {
            ctx.block_on(ctx.client.request_password_reset(&email))
                .context("password reset request failed")?;
            println!("If {email} has an account, a reset link is on its way");
        }
        PasswordSubcommand::Confirm {
            token,
            new_password,
        } => {
            ctx.block_on(ctx.client.confirm_password_reset(&token, &new_password))
                .context("password reset failed")?;
            println!("Password updated; run `academy login` to sign in");
        }
    }
    Ok(())
}
