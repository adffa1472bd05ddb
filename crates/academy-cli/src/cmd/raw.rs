use crate::ctx::Ctx;
use crate::output::print_json;
use anyhow::Context;

/// Escape hatch for endpoints without a typed command. Always prints JSON.
pub fn get(ctx: &Ctx, endpoint: &str) -> anyhow::Result<()> {
    let body = ctx
        .block_on(ctx.client.get(endpoint))
        .with_context(|| format!("GET {endpoint} failed"))?;
    print_json(&body)
}
