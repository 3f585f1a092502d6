#![crate_type = "bin"]
use std::io::{self, BufRead};

use refst::*;

const SHOWN: usize = 10;

fn main() {
    env_logger::init();
    let mut defs = Definitions::new();
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                println!("error: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, regex)) = line.split_once(" = ") {
            match defs.define(name.trim(), regex.trim()) {
                Ok(()) => println!("defined {}", name.trim()),
                Err(e) => println!("error: {}", e),
            }
            continue;
        }
        match Fst::compile(line, &defs) {
            Err(e) => println!("error: {}", e),
            Ok(fst) => {
                if let Ok(stats) = fst.stats() {
                    println!("{}", stats);
                }
                if let Ok(words) = fst.words() {
                    for w in words.take(SHOWN) {
                        println!("  {}", w);
                    }
                }
            }
        }
    }
}
