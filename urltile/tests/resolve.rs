use assert_fs::TempDir;
use predicates::str;
use rstest::rstest;
use test_utilities::{urltile_cmd, write_config};

#[rstest]
#[case("max_native_zoom: 15\n", "18 200000 100000", "https://t/15/25000/12500.png\n")]
#[case("max_native_zoom: 15\nflip_y: true\n", "18 8 16", "https://t/15/1/32765.png\n")]
#[case("max_native_zoom: 15\nflip_y: true\n", "3 4 2", "https://t/3/4/5.png\n")]
#[case("max_native_zoom: -1\n", "18 8 16", "https://t/18/8/16.png\n")]
fn resolve_online(#[case] extra: &str, #[case] tile: &str, #[case] expected: &'static str) {
	let dir = TempDir::new().unwrap();
	let config = write_config(&dir, &format!("url_template: \"https://t/{{z}}/{{x}}/{{y}}.png\"\n{extra}"));

	urltile_cmd()
		.arg("resolve")
		.arg(&config)
		.args(tile.split(' '))
		.assert()
		.success()
		.stdout(str::diff(expected));
}

#[test]
fn resolve_local_tree() {
	let dir = TempDir::new().unwrap();
	let config = write_config(&dir, "url_template: \"file:///data/tiles.jpg\"\nflip_y: true\n");

	urltile_cmd()
		.args(["resolve", &config, "2", "1", "0"])
		.assert()
		.success()
		.stdout(str::diff("/data/tiles/2/1/3.jpg\n"));
}

#[test]
fn resolve_falls_back_to_neutral_source() {
	let dir = TempDir::new().unwrap();
	let config = write_config(&dir, "url_template: \"\"\n");

	urltile_cmd()
		.args(["resolve", &config, "1", "1", "0"])
		.assert()
		.success()
		.stdout(str::diff("https://tile.openstreetmap.org/1/1/0.png\n"))
		.stderr(str::contains("neutral source"));
}

#[test]
fn resolve_rejects_unknown_fields() {
	let dir = TempDir::new().unwrap();
	let config = write_config(&dir, "template: \"https://t/{z}/{x}/{y}.png\"\n");

	urltile_cmd()
		.args(["resolve", &config, "1", "1", "0"])
		.assert()
		.failure()
		.stderr(str::contains("reading tile source config"));
}
