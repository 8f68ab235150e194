use felund_store::SharedState;
use rand::RngCore;

/// A fresh 32-byte circle secret, hex-encoded.
fn random_secret_hex() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Create a circle from a freshly-generated secret and print its invite code.
pub fn create(state: &SharedState, name: Option<String>, bind_hint: &str) -> anyhow::Result<()> {
    let secret = random_secret_hex();
    let circle_id = state.create_circle(&secret, name.clone());
    let code = felund_invite::make_invite_code(&secret, bind_hint);

    println!("circle:  {circle_id}");
    if let Some(name) = name {
        println!("name:    {name}");
    }
    println!("secret:  {secret}");
    println!("invite:  {code}");
    Ok(())
}

/// Join a circle from an invite code, returning the dial hint it carried.
pub fn join(state: &SharedState, invite_code: &str) -> anyhow::Result<String> {
    let (secret, peer_addr) = felund_invite::parse_invite_code(invite_code)?;
    let circle_id = state.create_circle(&secret, None);
    println!("circle:  {circle_id}");
    println!("peer:    {peer_addr}");
    Ok(peer_addr)
}
