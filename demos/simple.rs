//! basic example to showcase the main functions of HashRing

use consistent_ring::HashRing;

fn main() {
    let ring = HashRing::new();
    for node in ["127.0.0.1", "127.0.0.2", "127.0.0.3"] {
        ring.join(node);
    }

    // node positions on the ring, smallest first
    for member in ring.members() {
        println!("{:>10} @{}", member.id(), member.position());
    }

    // return the node responsible for 'foo' and the node to fall back to
    println!(
        "request foo @{}: {:?}",
        ring.position_of("foo"),
        ring.get("foo")
    );

    // only the requests on the arc of the removed node move to another node
    let before: Vec<_> = (0..1000)
        .map(|i| ring.get(&format!("request{i}")).map(|l| l.primary))
        .collect();
    ring.leave("127.0.0.2").expect("node joined above");
    let moved = (0..1000)
        .filter(|i| ring.get(&format!("request{i}")).map(|l| l.primary) != before[*i])
        .count();
    println!("requests remapped after 127.0.0.2 left: {moved} of 1000");
}
