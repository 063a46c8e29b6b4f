// Reads MIDI messages as lines of whitespace-separated hex bytes, from a
// file or from standard input, and prints the decode of each message.

use std::env;
use std::fs;
use std::io::prelude::*;

use dpsyx::{Decoder, RawMessage};

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut verbose = false;
    let mut input_file: Option<&String> = None;
    for arg in &args[1..] {
        if arg == "--verbose" {
            verbose = true;
        } else if input_file.is_none() {
            input_file = Some(arg);
        } else {
            println!("usage: dpsreceive [--verbose] [infile]");
            std::process::exit(1);
        }
    }

    let mut decoder = Decoder::new();
    let mut line_number: u64 = 0;

    if let Some(input_file) = input_file {
        let mut f = fs::File::open(input_file).expect("no file found");
        let mut text = String::new();
        f.read_to_string(&mut text).expect("unable to read file");
        for line in text.lines() {
            line_number += 1;
            process_line(&mut decoder, line, line_number, verbose);
        }
    } else {
        loop {
            let mut input = String::new();
            match std::io::stdin().read_line(&mut input) {
                Ok(0) => return,
                Ok(_) => {
                    line_number += 1;
                    process_line(&mut decoder, &input, line_number, verbose);
                }
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn process_line(decoder: &mut Decoder, line: &str, timestamp: u64, verbose: bool) {
    let mut bytes: Vec<u8> = Vec::new();
    for part in line.split_whitespace() {
        match u8::from_str_radix(part, 16) {
            Ok(b) => bytes.push(b),
            Err(e) => {
                eprintln!("Error in hex string: {}", e);
                return;
            }
        }
    }
    if bytes.is_empty() {
        return;
    }
    if let Some(text) = decoder.decode(&RawMessage::new(&bytes, timestamp), verbose) {
        println!("{}", text);
    }
}
