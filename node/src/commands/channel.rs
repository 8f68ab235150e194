use crate::error::NodeError;
use felund_proto::AccessMode;
use felund_store::SharedState;

pub fn create(
    state: &SharedState,
    circle_id: &str,
    channel_id: &str,
    access_mode: AccessMode,
    key: Option<String>,
) -> Result<(), NodeError> {
    if !state.has_circle(circle_id) {
        return Err(NodeError::UnknownCircle(circle_id.to_string()));
    }
    let key_hash = key.map(|k| felund_store::sha256_hex(k.as_bytes()));
    state.create_channel(circle_id, channel_id, access_mode, key_hash)?;
    println!("created #{channel_id}");
    Ok(())
}

pub fn join(
    state: &SharedState,
    circle_id: &str,
    channel_id: &str,
    key: Option<String>,
) -> Result<(), NodeError> {
    if !state.has_circle(circle_id) {
        return Err(NodeError::UnknownCircle(circle_id.to_string()));
    }
    state.join_channel(circle_id, channel_id, key)?;
    println!("requested to join #{channel_id}");
    Ok(())
}
