//! `gen_keys`: writes a random signing key to disk, for use with `pvfs2-gencred -k`
//! (§3, [SUPPLEMENT] in SPEC_FULL.md). Replaces the client-key-file generator this
//! binary used to be; the wire protocol has no notion of a per-client key file, only
//! the one signing key a credential is built against.

use clap::{App, Arg};
use rand::RngCore;
use std::fs;

fn main() {
    let matches = App::new("gen_keys")
        .version("1.0")
        .about("Generates a random signing key for pvfs2-gencred")
        .arg(Arg::with_name("KEY_FILE").help("Path to write the new key to").required(true))
        .arg(Arg::with_name("LENGTH").help("Key length in bytes").default_value("32"))
        .get_matches();

    let key_file = matches.value_of("KEY_FILE").unwrap();
    let length: usize = matches.value_of("LENGTH").unwrap().parse().expect("LENGTH must be a positive integer");

    let mut key = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut key);

    fs::write(key_file, &key).unwrap_or_else(|err| panic!("failed writing {}: {}", key_file, err));
    println!("Wrote a {}-byte signing key to {}", length, key_file);
}
