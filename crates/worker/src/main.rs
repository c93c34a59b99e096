use std::time::Duration;

use fibcalc_core::RecursiveFibonacci;
use fibcalc_infra::AppConfig;
use fibcalc_infra::cache::RedisResultCache;
use fibcalc_infra::event_bus::RedisPubSubBus;
use fibcalc_infra::workers::ComputeWorker;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fibcalc_observability::init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        redis = %config.redis_url,
        channel = %config.job_channel,
        "starting compute worker"
    );

    tokio::select! {
        res = run(&config) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            Ok(())
        }
    }
}

/// Consume jobs forever, reconnecting whenever the subscription ends.
///
/// Jobs published while disconnected are lost; their entries stay pending.
async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let cache = RedisResultCache::connect(&config.redis_url, Some(config.cache_hash_key.clone())).await?;
    let bus = RedisPubSubBus::connect(&config.redis_url).await?;

    ComputeWorker::new(RecursiveFibonacci, cache)
        .run_resubscribing(&bus, &config.job_channel, RECONNECT_DELAY)
        .await;
    Ok(())
}
