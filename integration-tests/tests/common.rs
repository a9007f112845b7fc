use integration_tests::harness::Synthesized;

#[allow(dead_code)]
pub fn find<'a>(results: &'a [Synthesized], key: &str) -> &'a Synthesized {
    results
        .iter()
        .find(|r| r.virtual_server == key)
        .unwrap_or_else(|| panic!("no synthesized VirtualServer {key}"))
}
