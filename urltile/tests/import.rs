use assert_fs::{TempDir, prelude::*};
use predicates::str;
use test_utilities::{path_str, urltile_cmd};

#[test]
fn import_flat_directory() {
	let dir = TempDir::new().unwrap();
	let tiles = dir.child("tiles");
	tiles.child("12_100_200.png").write_binary(b"tile").unwrap();
	tiles.child("12_101_200.png").write_binary(b"tile").unwrap();
	tiles.child("thumbs.db").write_binary(b"junk").unwrap();
	let cache = dir.child("cache");

	urltile_cmd()
		.args(["import", path_str(tiles.path()), "--cache-dir", path_str(cache.path())])
		.assert()
		.success()
		.stdout(str::contains("inserted 2 tiles, skipped 1 files"));

	cache.child("cache.db").assert(predicates::path::exists());
}

#[test]
fn import_tree_with_progress() {
	let dir = TempDir::new().unwrap();
	let tiles = dir.child("pyramid");
	tiles.child("0/0/0.png").write_binary(b"a").unwrap();
	tiles.child("1/1/0.jpg").write_binary(b"b").unwrap();
	let cache = dir.child("cache");

	urltile_cmd()
		.args([
			"import",
			path_str(tiles.path()),
			"--tree",
			"--progress",
			"-v",
			"--provider",
			"Custom",
			"--cache-dir",
			path_str(cache.path()),
		])
		.assert()
		.success()
		.stdout(str::contains("inserted 2 tiles, skipped 0 files"))
		.stderr(str::contains("import 100% (2/2)"));
}

#[test]
fn import_rejects_unknown_key_scheme() {
	let dir = TempDir::new().unwrap();
	urltile_cmd()
		.args(["import", path_str(dir.path()), "--key-scheme", "zigzag"])
		.assert()
		.failure()
		.code(2)
		.stderr(str::contains("unknown key scheme"));
}
