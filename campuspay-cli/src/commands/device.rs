//! Device command - show what this device reports to the payment service

use anyhow::Result;
use colored::Colorize;

use campuspay_core::adapters::device::HostDevice;
use campuspay_core::DeviceInfoProvider;

use crate::output;

pub fn run() -> Result<()> {
    let device = HostDevice::new();
    let info = device.snapshot();
    let identity = device.identity();

    println!("{}", "Device".bold());
    let mut table = output::create_table();
    table.add_row(vec!["Platform ID", identity.platform_id.as_str()]);
    table.add_row(vec!["Build", info.device_id.as_str()]);
    table.add_row(vec!["Model", info.model.as_str()]);
    table.add_row(vec!["Manufacturer", info.manufacturer.as_str()]);
    table.add_row(vec!["OS version", info.os_version.as_str()]);
    println!("{}", table);

    Ok(())
}
