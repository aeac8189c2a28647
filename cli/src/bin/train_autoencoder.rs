// SPDX-License-Identifier: MIT OR Apache-2.0

use anyhow::Result;
use clap::Parser;
use gotrain_cli::init_logging;
use gotrain_cli::train::{run, TrainArgs};

fn main() -> Result<()> {
    let args = TrainArgs::parse();
    init_logging(args.verbose);

    let report = run(&args)?;
    println!(
        "trained {} steps over {} epoch(s): final loss {:.5}, mean loss {:.5}",
        report.steps, report.epochs, report.final_train_loss, report.mean_train_loss
    );
    if let Some(loss) = report.validation_loss {
        println!("validation loss {loss:.5}");
    }
    Ok(())
}
