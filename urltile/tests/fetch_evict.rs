use assert_fs::{TempDir, prelude::*};
use predicates::str;
use test_utilities::{path_str, urltile_cmd, write_config};

#[test]
fn fetch_local_tile_to_stdout() {
	let dir = TempDir::new().unwrap();
	dir.child("tiles/2/1/1.png").write_binary(b"tile bytes").unwrap();
	let config = write_config(
		&dir,
		&format!("url_template: \"{}/tiles/{{z}}/{{x}}/{{y}}.png\"\n", dir.path().display()),
	);

	urltile_cmd()
		.args(["fetch", &config, "2", "1", "1"])
		.assert()
		.success()
		.stdout(str::diff("tile bytes"));
}

#[test]
fn fetch_from_offline_cache() {
	let dir = TempDir::new().unwrap();
	let tiles = dir.child("import");
	tiles.child("5_3_7.png").write_binary(b"cached tile").unwrap();
	let cache = dir.child("cache");

	urltile_cmd()
		.args(["import", path_str(tiles.path()), "--cache-dir", path_str(cache.path())])
		.assert()
		.success();

	let config = write_config(
		&dir,
		&format!(
			"url_template: \"https://unreachable.invalid/{{z}}/{{x}}/{{y}}.png\"\noffline_mode: true\ncache_path: \"file://{}\"\n",
			cache.path().display()
		),
	);
	let output = dir.child("tile.png");

	urltile_cmd()
		.args(["fetch", &config, "5", "3", "7", "-o", path_str(output.path())])
		.assert()
		.success();
	output.assert("cached tile");

	urltile_cmd()
		.args(["fetch", &config, "5", "3", "8"])
		.assert()
		.failure()
		.stderr(str::contains("tile 5/3/8 not found"));
}

#[test]
fn evict_keeps_fresh_tiles() {
	let dir = TempDir::new().unwrap();
	let tiles = dir.child("import");
	tiles.child("1_0_0.png").write_binary(b"a").unwrap();
	let cache = dir.child("cache");

	urltile_cmd()
		.args(["import", path_str(tiles.path()), "--cache-dir", path_str(cache.path())])
		.assert()
		.success();

	urltile_cmd()
		.args(["evict", path_str(cache.path())])
		.assert()
		.success()
		.stdout(str::diff("removed 0 expired tiles, 1 remaining\n"));
}

#[test]
fn evict_missing_cache_fails() {
	let dir = TempDir::new().unwrap();
	urltile_cmd()
		.args(["evict", path_str(&dir.path().join("nothing"))])
		.assert()
		.failure()
		.stderr(str::contains("does not exist"));
}
