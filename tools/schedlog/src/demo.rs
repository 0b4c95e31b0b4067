use crate::errors::SchedlogError;
use crate::logger::Logger;
use crate::usher::Usher;
use std::sync::Arc;
use std::time::Duration;

const STEP: Duration = Duration::from_millis(10);

/// Ushers `A`, `B` and `C` from a supervisor. `B` ushers its own `A`, `C`
/// awaits `B` directly, so the batch mixes one, two and three level chains.
pub async fn fork_join(logger: Arc<Logger>) -> Result<Vec<String>, SchedlogError> {
    logger.info("supervisor ushering A, B and C")?;

    // Timestamps have millisecond resolution; snapshots taken within the same
    // millisecond would tie.
    let mut usher = Usher::new(Arc::clone(&logger));
    usher.usher(a(Arc::clone(&logger), String::new()));
    tokio::time::sleep(STEP).await;
    usher.usher(b(Arc::clone(&logger), String::new()));
    tokio::time::sleep(STEP).await;
    usher.usher(c(Arc::clone(&logger), String::new()));
    let results = usher.join().await?.into_iter().collect::<Result<Vec<_>, _>>()?;

    logger.info(&format!("supervisor collected {}", results.join(", ")))?;
    Ok(results)
}

async fn a(logger: Arc<Logger>, prefix: String) -> Result<String, SchedlogError> {
    let name = format!("{prefix}A");
    logger.info(&format!("{name} starts ..."))?;
    tokio::time::sleep(STEP * 3).await;
    logger.info(&format!("... {name} ends"))?;
    Ok(name)
}

async fn b(logger: Arc<Logger>, prefix: String) -> Result<String, SchedlogError> {
    let name = format!("{prefix}B");
    logger.info(&format!("{name} starts ..."))?;
    let mut usher = Usher::new(Arc::clone(&logger));
    usher.usher(a(Arc::clone(&logger), format!("{name}->")));
    let inner = usher.join().await?.into_iter().collect::<Result<Vec<_>, _>>()?;
    logger.info(&format!("... {name} ends after {}", inner.join(", ")))?;
    Ok(name)
}

async fn c(logger: Arc<Logger>, prefix: String) -> Result<String, SchedlogError> {
    let name = format!("{prefix}C");
    logger.info(&format!("{name} starts ..."))?;
    tokio::time::sleep(STEP).await;
    let inner = b(Arc::clone(&logger), format!("{name}->")).await?;
    logger.info(&format!("... {name} ends after {inner}"))?;
    Ok(name)
}
