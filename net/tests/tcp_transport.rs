use std::{sync::mpsc::channel, time::Duration};

use load_balancer_net::{
    channel::{Channel, ChannelError},
    contracts::{Envelope, Message},
    sockets::tcp_transport::TcpTransport,
};

const ANY_PORT: &str = "127.0.0.1:0";

#[test]
fn delivers_in_order_with_sender_rank() {
    let (sender, receiver) = channel::<Envelope>();
    let worker = TcpTransport::bind(1, &[ANY_PORT.to_owned(), ANY_PORT.to_owned()], sender).unwrap();

    let peers = vec![ANY_PORT.to_owned(), worker.local_addr().to_string()];
    let (sender, _operator_inbox) = channel::<Envelope>();
    let operator = TcpTransport::bind(0, &peers, sender).unwrap();

    let command_line = vec![String::from("sleep"), String::from("1")];
    operator.send(1, &Message::place(command_line.clone())).unwrap();
    operator.send(1, &Message::list(1)).unwrap();
    operator.send(1, &Message::terminate()).unwrap();

    let timeout = Duration::from_secs(5);
    let received: Vec<Envelope> = (0..3)
        .map(|_| receiver.recv_timeout(timeout).unwrap())
        .collect();

    assert_eq!(
        vec![
            Envelope::new(0, Message::place(command_line)),
            Envelope::new(0, Message::list(1)),
            Envelope::new(0, Message::terminate()),
        ],
        received
    );
}

#[test]
fn oversized_messages_are_rejected() {
    let (sender, _receiver) = channel::<Envelope>();
    let transport = TcpTransport::bind(1, &[ANY_PORT.to_owned(), ANY_PORT.to_owned()], sender).unwrap();

    let command_line = vec![String::from("x"); 5000];
    let result = transport.send(0, &Message::place(command_line));

    assert!(matches!(result, Err(ChannelError::Encode { .. })));
}

#[test]
fn unknown_rank_is_not_connected() {
    let (sender, _receiver) = channel::<Envelope>();
    let transport = TcpTransport::bind(1, &[ANY_PORT.to_owned(), ANY_PORT.to_owned()], sender).unwrap();

    assert_eq!(
        Err(ChannelError::NotConnected { rank: 7 }),
        transport.send(7, &Message::presence())
    );
}

#[test]
fn bind_needs_an_address_for_the_rank() {
    let (sender, _receiver) = channel::<Envelope>();

    assert!(matches!(
        TcpTransport::bind(3, &[ANY_PORT.to_owned()], sender),
        Err(ChannelError::NotConnected { rank: 3 })
    ));
}
