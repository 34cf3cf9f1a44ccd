//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `docreg_core` linkage.
//! - Walk one record chain (create, supersede, invalidate) in memory.

use docreg_core::{
    CallContext, DocumentHash, Identity, NewRecord, OrganisationDirectory, RegistryEvent,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("docreg_core ping={}", docreg_core::ping());
    println!("docreg_core version={}", docreg_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=smoke_run module=cli status=error error={err}");
            eprintln!("smoke run failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let owner = Identity::generate();
    let mut directory = OrganisationDirectory::new("smoke organisation", owner)?;
    let (register, deployed) = directory.deploy_register(owner, "smoke register")?;
    println!("directory event={} registry_id={}", deployed.name(), register.id());

    let first = DocumentHash::from_bytes([0x11; 32]);
    let second = DocumentHash::from_bytes([0x22; 32]);
    let ctx = CallContext::at_system_time(owner);

    print_events(register.create_record(&ctx, &NewRecord::new(first, "doc://v1", "ref://v1"))?);
    print_events(register.create_record(
        &ctx.at(ctx.now + 1),
        &NewRecord::new(second, "doc://v2", "ref://v2").superseding(first),
    )?);
    print_events(register.invalidate_record(&ctx.at(ctx.now + 2), second)?);

    let head = register.read(second)?;
    println!(
        "record hash={second} past={} expires_at={}",
        head.past_document_hash, head.expires_at
    );
    Ok(())
}

fn print_events(events: Vec<RegistryEvent>) {
    for event in events {
        println!("event={} hash={}", event.names().join("+"), event.hash());
    }
}
