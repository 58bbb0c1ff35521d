use crate::directory::{ChannelDirectory, LookupError};

/// Indexed template variables. Page templates address directory
/// entries through two namespaces, `externalChannel.<field>` for
/// records and `channelFeed.<field>` for configured feeds.
pub async fn lookup_indexed(
    dir: &ChannelDirectory,
    var_name: &str,
    index: usize
) -> Result<String, LookupError> {
    if let Some(field) = var_name.strip_prefix("externalChannel.") {
        dir.lookup_channel_field(index, field).await
    } else if let Some(field) = var_name.strip_prefix("channelFeed.") {
        dir.lookup_feed_field(index, field).await
    } else {
        Err(LookupError::UnknownField)
    }
}

/// Unindexed template variables, computed on demand
pub async fn lookup_global(dir: &ChannelDirectory, var_name: &str) -> Result<String, LookupError> {
    match var_name {
        "totalListeners" => Ok(dir.total_listeners().await.to_string()),
        "totalRelays" => Ok(dir.total_relays().await.to_string()),
        "lastUpdate" => {
            let diff = chrono::offset::Utc::now().timestamp() - dir.last_update().await;
            Ok(render_elapsed(diff))
        },
        _ => Err(LookupError::UnknownField)
    }
}

fn render_elapsed(diff: i64) -> String {
    let min = diff / 60;
    let sec = diff % 60;
    if min == 0 {
        format!("{}s", sec)
    } else {
        format!("{}m {}s", min, sec)
    }
}
