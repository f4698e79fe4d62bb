#![allow(dead_code)]

use groutpdf::{transpile, Error, FontDirs};
use std::path::PathBuf;

pub const TR_SAMPLE: &str = "name TR\n\
internalname Times-Roman\n\
spacewidth 250\n\
charset\n\
h\t500,662\t2\t104\th\n\
e\t444,448\t2\t101\te\n\
l\t278,683\t2\t108\tl\n\
o\t500,448\t2\t111\to\n\
n\t500,448\t2\t110\tn\n\
t\t278,579\t2\t116\tt\n\
w\t722,448\t2\t119\tw\n\
hy\t333,257\t2\t45\thyphen\n";

pub const CR_SAMPLE: &str = "name CR\n\
internalname Courier\n\
spacewidth 600\n\
charset\n\
h\t600,629\t2\t104\th\n\
e\t600,441\t2\t101\te\n";

/// Fresh fake devpdf directory holding TR and CR descriptions.
pub fn fixture_dirs() -> FontDirs {
    let dir: PathBuf = std::env::temp_dir().join(format!(
        "groutpdf_it_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(dir.join("TR"), TR_SAMPLE).expect("write TR");
    std::fs::write(dir.join("CR"), CR_SAMPLE).expect("write CR");
    FontDirs::with_dirs(vec![dir])
}

pub fn run(input: &str) -> Vec<u8> {
    let mut out = Vec::new();
    transpile(input.as_bytes(), &mut out, fixture_dirs()).expect("transpile");
    out
}

pub fn run_err(input: &str) -> (Vec<u8>, Error) {
    let mut out = Vec::new();
    let err = transpile(input.as_bytes(), &mut out, fixture_dirs()).expect_err("must fail");
    (out, err)
}

pub const PROLOGUE: &str = "x T pdf\nx res 72000 1 1\nx init\nx font 1 TR\n";
