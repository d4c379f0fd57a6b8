//! `test_listen`: a raw TCP probe that accepts one connection and decodes the fixed
//! 8-byte generic header off whatever it sends, printing the release/encoding it
//! advertises. Kept in the raw `mio::Poll` style rather than wired through the job
//! engine's network shim, since its purpose is to eyeball bytes on the wire during
//! development, not to exercise C3 (§1 Non-goals).

use mio::net::TcpListener;
use pvfs_wire::codec::Decoder;
use pvfs_wire::header::GenericHeader;
use std::io::Read;
use std::net::SocketAddr;

fn main() {
    let server_poll = mio::Poll::new().unwrap();
    let read_poll = mio::Poll::new().unwrap();
    let server = TcpListener::bind(&"127.0.0.1:28008".parse::<SocketAddr>().unwrap()).unwrap();

    server_poll
        .register(&server, mio::Token(0), mio::Ready::readable() | mio::Ready::writable(), mio::PollOpt::edge())
        .unwrap();

    let mut events = mio::Events::with_capacity(8192);
    server_poll.poll(&mut events, None).expect("listen poll failed");

    let mut streams: Vec<mio::net::TcpStream> = events
        .iter()
        .map(|event| {
            println!("{:?}", event);
            server.accept().unwrap().0
        })
        .collect();

    events.clear();

    read_poll.register(&streams[0], mio::Token(0), mio::Ready::readable(), mio::PollOpt::level()).unwrap();

    loop {
        read_poll.poll(&mut events, None).unwrap();

        let mut data = Vec::new();
        for event in &events {
            println!("{:?}", event);
            let _ = streams[0].read_to_end(&mut data);
        }

        if data.len() >= GenericHeader::SIZE {
            let mut dec = Decoder::new(&data[..GenericHeader::SIZE]);
            match GenericHeader::decode(&mut dec) {
                Ok(header) => println!("generic header: release={} encoding={}", header.release, header.encoding),
                Err(err) => println!("bad header: {:?}", err),
            }
        } else {
            println!("received {} bytes, too short for a generic header", data.len());
        }
    }
}
