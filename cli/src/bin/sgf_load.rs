// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::Result;
use clap::Parser;
use gotrain_cli::sgf_load::{run, SgfLoadArgs};
use gotrain_cli::init_logging;

fn main() -> Result<()> {
    let args = SgfLoadArgs::parse();
    init_logging(args.verbose);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&args, &mut out)
}
