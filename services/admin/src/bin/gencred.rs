//! `pvfs2-gencred`: builds a signed credential and writes its wire encoding to stdout.
//! CLI surface and the userid/groups/issuer/timeout shape follow
//! `original_source/src/apps/admin/pvfs2-gencred.c`; the signature itself is computed
//! with `pvfs_support::signing` rather than OpenSSL (§1 Non-goals, DESIGN.md).

use clap::{App, Arg};
use pvfs_types::Credential;
use pvfs_wire::codec::Encoder;
use std::fs;
use std::io::{self, Write};
use std::process;

fn main() {
    let matches = App::new("pvfs2-gencred")
        .version("1.0")
        .about("Generates a signed credential")
        .arg(Arg::with_name("userid").short("u").long("userid").help("Numeric user id").takes_value(true).required(true))
        .arg(Arg::with_name("groups").short("g").long("groups").help("Comma separated numeric group ids").takes_value(true))
        .arg(Arg::with_name("issuer").short("i").long("issuer").help("Issuer string, defaults to C:<hostname>").takes_value(true))
        .arg(Arg::with_name("timeout").short("t").long("timeout").help("Seconds of validity from now").takes_value(true).default_value("3600"))
        .arg(Arg::with_name("keyfile").short("k").long("keyfile").help("Path to the signing key").takes_value(true).required(true))
        .get_matches();

    if atty::is(atty::Stream::Stdout) {
        eprintln!("Error: refusing to write a binary credential to a terminal, redirect stdout to a file or pipe");
        process::exit(1);
    }

    let userid: u32 = matches.value_of("userid").unwrap().parse().expect("userid must be a non-negative integer");
    let group_array: Vec<u32> = match matches.value_of("groups") {
        Some(list) => list.split(',').map(|g| g.trim().parse().expect("group ids must be non-negative integers")).collect(),
        None => Vec::new(),
    };
    let issuer = matches.value_of("issuer").map(String::from).unwrap_or_else(default_issuer);
    let valid_secs: i64 = matches.value_of("timeout").unwrap().parse().expect("timeout must be an integer number of seconds");
    let timeout = pvfs_support::time::timestamp_secs() + valid_secs;

    let key = fs::read(matches.value_of("keyfile").unwrap()).unwrap_or_else(|err| {
        eprintln!("Error: failed to read keyfile: {}", err);
        process::exit(1);
    });

    let draft = Credential::new(userid, group_array.clone(), issuer.clone(), timeout, Vec::new());
    let signature = pvfs_support::signing::sign(&key, &draft.signable_bytes());
    let credential = Credential::new(userid, group_array, issuer, timeout, signature);

    let mut enc = Encoder::with_capacity(128);
    enc.write_credential(&credential);
    let body = enc.finish();

    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_le_bytes());
    framed.extend_from_slice(&body);

    io::stdout().write_all(&framed).expect("write credential to stdout");
}

/// Matches `pvfs2-gencred`'s default issuer shape ("C:" followed by the local host
/// name); falls back to "C:localhost" when the hostname cannot be read, since this
/// workspace does not carry a hostname-lookup crate (§1 Non-goals).
fn default_issuer() -> String {
    match fs::read_to_string("/etc/hostname") {
        Ok(name) => format!("C:{}", name.trim()),
        Err(_) => "C:localhost".to_string(),
    }
}
