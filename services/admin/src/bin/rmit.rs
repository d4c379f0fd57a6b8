//! `pvfs2-rmit`: removes each named file by driving a REMOVE op through a one-shot
//! round-trip machine. Argument shape follows
//! `original_source/src/apps/admin/pvfs2-rmit.c` (file list, no other required flags).

use clap::{App, Arg};
use pvfs2_admin::{run_one_shot, standalone_server};
use pvfs_types::tag::RequestTag;
use pvfs_types::{FsId, Handle};
use std::process;

fn main() {
    let matches = App::new("pvfs2-rmit")
        .version("1.0")
        .about("Removes each given file")
        .arg(Arg::with_name("FILES").help("Files to remove").required(true).multiple(true))
        .get_matches();

    let log = pvfs_support::logging::discard();
    let srv = standalone_server(log);

    let mut exit_code = 0;
    for (index, filename) in matches.values_of("FILES").unwrap().enumerate() {
        let status = run_one_shot(&srv, RequestTag::Remove, Handle::new(index as u64 + 1), FsId(1));
        if status == 0 {
            println!("{}: removed", filename);
        } else {
            eprintln!("{}: remove failed, status {}", filename, status);
            exit_code = 1;
        }
    }

    srv.finalize();
    process::exit(exit_code);
}
