use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::cli::WatchArgs;
use crate::error::CliError;
use crate::output::Reporter;

use super::{latest, Context};

pub async fn run(args: &WatchArgs, ctx: &Context, reporter: &mut Reporter) -> Result<(), CliError> {
    let mut interval = tokio::time::interval(Duration::from_secs(args.every_secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut completed: u32 = 0;
    loop {
        let step = async {
            interval.tick().await;
            latest::run(&args.latest, ctx).await
        };
        let result = tokio::select! {
            result = step => result?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        };

        reporter.emit(&result)?;
        ctx.cache.clear_expired().await;
        completed += 1;

        if args.iterations.is_some_and(|limit| completed >= limit) {
            break;
        }
    }

    info!(iterations = completed, "watch stopped");
    Ok(())
}
