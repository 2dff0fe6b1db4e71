//! Early bring-up of the interrupt subsystem.
//!
//! Ordering matters: the GDT and its IST slot must exist before the IDT
//! gates that reference them are loaded, and the IDT must be complete
//! before `lidt` hands it to hardware.  Platform services are registered
//! last so the dispatcher never calls into a half-initialized driver.

use cinderos_core::platform;
use cinderos_drivers::{apic, serial};
use cinderos_lib::{cpu, klog_info};

use crate::{gdt, idt, ist_stacks};

fn load_paging_root(root: u64) {
    cpu::write_cr3(root);
}

pub fn interrupts_init() {
    serial::init();

    gdt::gdt_init();
    ist_stacks::ist_stacks_init();

    idt::idt_init();
    idt::idt_load();

    if apic::detect() {
        apic::init();
    }

    platform::register_send_eoi_fn(apic::send_eoi);
    platform::register_load_paging_root_fn(load_paging_root);

    klog_info!("INT: Interrupt subsystem online");
}
