// Encodes one command line into an Akai DPS SysEx frame and prints it as
// hex, together with the module's report. Run without arguments for the
// command catalogue.

use std::env;

use dpsyx::{ModuleRegistry, IDENTITY_REQUEST};

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut registry = ModuleRegistry::new();
    let module = registry.resolve("AkaiPro").expect("AkaiPro module");

    if args.len() < 2 {
        println!("usage: dpscommand identify|<command ...>");
        for command in module.commands() {
            println!("  {}", command);
        }
        std::process::exit(1);
    }

    let line = args[1..].join(" ");
    if line == "identify" {
        println!("TX: {}", hex::encode(IDENTITY_REQUEST));
        return;
    }

    let reply = module.command(&line);
    if let Some(report) = &reply.report {
        println!("{}", report);
    }
    match &reply.frame {
        Some(frame) => println!("TX: {}", hex::encode(frame)),
        None => {
            if reply.report.is_none() {
                println!("unrecognized command: {}", line);
            }
        }
    }
}
