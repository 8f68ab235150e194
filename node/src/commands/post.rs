use crate::error::NodeError;
use felund_store::SharedState;

pub fn run(
    state: &SharedState,
    circle_id: &str,
    channel_id: &str,
    text: &str,
    encrypt: bool,
) -> Result<(), NodeError> {
    if !state.has_circle(circle_id) {
        return Err(NodeError::UnknownCircle(circle_id.to_string()));
    }
    let msg = state.send_message(circle_id, channel_id, text, encrypt)?;
    println!("posted {} into #{channel_id}", msg.msg_id);
    Ok(())
}
