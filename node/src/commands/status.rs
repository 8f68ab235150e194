use felund_store::SharedState;

pub fn run(state: &SharedState) {
    let node = state.node_config();
    println!("node_id:   {}", node.node_id);
    println!("bind:      {}:{}", node.bind, node.port);
    println!("display:   {}", node.display_name);
    println!("can_anchor:      {}", node.can_anchor);
    println!("public_reachable: {}", node.public_reachable);
    let rendezvous = if node.rendezvous_base.is_empty() {
        "(disabled)"
    } else {
        node.rendezvous_base.as_str()
    };
    println!("rendezvous_base: {rendezvous}");
    println!();

    for circle_id in state.list_circle_ids() {
        let messages = state.all_messages(&circle_id);
        println!("circle {circle_id}: {} messages", messages.len());
    }
}
