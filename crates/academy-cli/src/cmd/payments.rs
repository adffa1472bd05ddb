use crate::ctx::Ctx;
use crate::output::{opt, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum PaymentsSubcommand {
    /// List past payments
    List,
    /// Start a checkout and print the payment link
    Start {
        /// Plan to purchase
        #[arg(long, default_value = "full")]
        plan: String,
    },
    /// Confirm a completed checkout
    Verify { reference: String },
}

pub fn run(ctx: &Ctx, subcmd: PaymentsSubcommand) -> anyhow::Result<()> {
    ctx.require_session()?;
    match subcmd {
        PaymentsSubcommand::List => list(ctx),
        PaymentsSubcommand::Start { plan } => start(ctx, &plan),
        PaymentsSubcommand::Verify { reference } => verify(ctx, &reference),
    }
}

fn list(ctx: &Ctx) -> anyhow::Result<()> {
    let payments = ctx
        .block_on(ctx.client.payments())
        .context("failed to load payments")?;
    if ctx.json {
        return print_json(&payments);
    }

    let rows = payments
        .iter()
        .map(|p| {
            vec![
                opt(p.reference.as_deref()),
                format!("{:.2} {}", p.amount, p.currency),
                p.status.clone(),
                opt(p.created_at.map(|d| d.date_naive())),
            ]
        })
        .collect();
    print_table(&["REFERENCE", "AMOUNT", "STATUS", "DATE"], rows, "No payments.");
    Ok(())
}

fn start(ctx: &Ctx, plan: &str) -> anyhow::Result<()> {
    let checkout = ctx
        .block_on(ctx.client.initiate_payment(plan))
        .context("failed to start checkout")?;
    if ctx.json {
        return print_json(&checkout);
    }
    println!("Reference: {}", checkout.reference);
    if let Some(url) = &checkout.authorization_url {
        println!("Complete payment at: {url}");
    }
    println!(
        "Then run `academy payments verify {}`",
        checkout.reference
    );
    Ok(())
}

fn verify(ctx: &Ctx, reference: &str) -> anyhow::Result<()> {
    let payment = ctx
        .block_on(ctx.client.verify_payment(reference))
        .with_context(|| format!("failed to verify payment {reference}"))?;
    if ctx.json {
        return print_json(&payment);
    }
    println!("Payment {reference}: {}", payment.status);
    Ok(())
}
