#![no_main]

use libfuzzer_sys::fuzz_target;
use retro_contract::{
    EnvironmentCommand, LegacyVariable, MemoryDescriptor, MemoryDescriptorFlags, MemoryMap,
    MemoryType,
};

fn word(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    let len = bytes.len().min(8);
    buf[..len].copy_from_slice(&bytes[..len]);
    u64::from_le_bytes(buf)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let raw = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if let Ok(command) = EnvironmentCommand::decode(raw) {
        assert_eq!(EnvironmentCommand::decode(command.raw()), Ok(command));
    }

    // Five words per descriptor: start, select, disconnect, len, flags.
    let descriptors: Vec<MemoryDescriptor> = data[4..]
        .chunks(40)
        .take(8)
        .map(|chunk| {
            let field = |index: usize| word(chunk.get(index * 8..).unwrap_or(&[]));
            let mut descriptor =
                MemoryDescriptor::linear(MemoryType::SYSTEM_RAM, field(0), field(3));
            descriptor.select = field(1);
            descriptor.disconnect = field(2);
            descriptor.flags = MemoryDescriptorFlags::from_bits_truncate(field(4));
            descriptor
        })
        .collect();
    if let Ok(map) = MemoryMap::new(descriptors) {
        let addr = word(&data[..data.len().min(8)]);
        if let Some(resolved) = map.resolve("", addr) {
            let descriptor = &map.descriptors()[resolved.descriptor];
            assert!(descriptor.claims(addr));
            if descriptor.len != 0 {
                assert!(resolved.offset.wrapping_sub(descriptor.offset) < descriptor.len);
            }
        }
    }

    let variable = LegacyVariable {
        key: "fuzz_option".to_owned(),
        value: String::from_utf8_lossy(&data[4..]).into_owned(),
    };
    if let Ok(definition) = variable.parse() {
        assert!(!definition.values.is_empty());
        assert!(definition.effective_default().is_some());
    }
});
