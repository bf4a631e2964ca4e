//! Tiny crate for common logic for finding the OpenCL ICD loader.

use std::{
    env,
    path::{Path, PathBuf},
};

/// File names the ICD loader is shipped under on this platform, most specific first.
#[cfg(target_os = "linux")]
pub fn library_names() -> &'static [&'static str] {
    &["libOpenCL.so.1", "libOpenCL.so"]
}

#[cfg(target_os = "macos")]
pub fn library_names() -> &'static [&'static str] {
    &["OpenCL", "libOpenCL.dylib"]
}

#[cfg(target_os = "windows")]
pub fn library_names() -> &'static [&'static str] {
    &["OpenCL.dll"]
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub fn library_names() -> &'static [&'static str] {
    &["libOpenCL.so.1", "libOpenCL.so"]
}

// Returns true if the given path looks like an OpenCL SDK installation
fn is_opencl_root_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().join("include").join("CL").join("cl.h").is_file()
}

pub fn find_opencl_root() -> Option<PathBuf> {
    // search through the common environment variables first
    for path in ["OPENCL_ROOT", "OCL_ROOT", "CUDA_PATH"]
        .iter()
        .filter_map(|name| env::var(*name).ok())
    {
        if is_opencl_root_path(&path) {
            return Some(path.into());
        }
    }

    // If it wasn't specified by env var, try the default installation paths. The CUDA
    // toolkit ships an ICD loader next to its own libraries.
    #[cfg(not(target_os = "windows"))]
    let default_paths = ["/usr/local/cuda", "/opt/cuda", "/opt/rocm"];
    #[cfg(target_os = "windows")]
    let default_paths = ["C:/Program Files (x86)/OCL_SDK_Light"];

    default_paths
        .into_iter()
        .find(|path| is_opencl_root_path(path))
        .map(PathBuf::from)
}

/// Splits a search path list the way the platform separates `PATH` entries.
pub fn split_paths(value: &str) -> Vec<PathBuf> {
    let split_char = if cfg!(target_os = "windows") {
        ';'
    } else {
        ':'
    };
    value
        .split(split_char)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

pub fn read_env() -> Vec<PathBuf> {
    // The location of the ICD loader can be hardcoded with the OPENCL_LIBRARY_PATH
    // environment variable. Entries may be directories or the library file itself.
    env::var("OPENCL_LIBRARY_PATH")
        .map(|path| split_paths(&path))
        .unwrap_or_default()
}

fn root_lib_dirs(root: &Path) -> Vec<PathBuf> {
    ["lib", "lib64", "lib/x64", "lib/x86_64"]
        .iter()
        .map(|dir| root.join(dir))
        .collect()
}

#[cfg(target_os = "linux")]
fn default_lib_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/lib/x86_64-linux-gnu"),
        PathBuf::from("/usr/lib/aarch64-linux-gnu"),
        PathBuf::from("/usr/lib64"),
        PathBuf::from("/usr/lib"),
        PathBuf::from("/usr/local/cuda/lib64"),
        PathBuf::from("/opt/rocm/lib"),
    ];
    if let Ok(paths) = glob::glob("/usr/local/cuda-*/lib64") {
        dirs.extend(paths.flatten());
    }
    dirs
}

#[cfg(target_os = "macos")]
fn default_lib_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("/System/Library/Frameworks/OpenCL.framework")]
}

#[cfg(target_os = "windows")]
fn default_lib_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("C:/Windows/System32")]
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn default_lib_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("/usr/local/lib"), PathBuf::from("/usr/lib")]
}

/// Directories that may contain the ICD loader, in search order.
pub fn find_opencl_lib_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = read_env().into_iter().filter(|p| p.is_dir()).collect();
    if let Some(root) = find_opencl_root() {
        dirs.extend(root_lib_dirs(&root));
    }
    dirs.extend(default_lib_dirs());
    dirs.retain(|dir| dir.is_dir());
    dirs.dedup();
    dirs
}

/// Builds the ordered candidate list from explicit entries and library directories.
///
/// Explicit file entries come first, then every known library name inside each
/// directory that exists on disk, and finally the bare library names so the system
/// dynamic loader gets the last word.
pub fn candidates_from(explicit: &[PathBuf], dirs: &[PathBuf], names: &[&str]) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = explicit.iter().filter(|p| p.is_file()).cloned().collect();

    for dir in dirs {
        for name in names {
            let path = dir.join(name);
            if path.is_file() && !candidates.contains(&path) {
                candidates.push(path);
            }
        }
    }

    candidates.extend(names.iter().map(PathBuf::from));
    candidates
}

/// Every path worth handing to the dynamic loader, most specific first.
pub fn find_opencl_library_candidates() -> Vec<PathBuf> {
    candidates_from(&read_env(), &find_opencl_lib_dirs(), library_names())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("find_opencl_helper_{name}_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn split_paths_skips_empty_entries() {
        let sep = if cfg!(target_os = "windows") { ";" } else { ":" };
        let value = format!("a{sep}{sep}b{sep}");
        assert_eq!(split_paths(&value), vec![PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn bare_names_are_always_last() {
        let names = ["libfoo.so.1", "libfoo.so"];
        let candidates = candidates_from(&[], &[], &names);
        assert_eq!(
            candidates,
            vec![PathBuf::from("libfoo.so.1"), PathBuf::from("libfoo.so")]
        );
    }

    #[test]
    fn existing_files_in_dirs_come_before_bare_names() {
        let dir = scratch_dir("dirs");
        let lib = dir.join("libfoo.so");
        fs::write(&lib, b"").unwrap();

        let candidates = candidates_from(&[], &[dir.clone()], &["libfoo.so.1", "libfoo.so"]);
        assert_eq!(candidates[0], lib);
        assert_eq!(candidates.len(), 3);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn explicit_files_take_priority() {
        let dir = scratch_dir("explicit");
        let explicit = dir.join("custom_icd.so");
        fs::write(&explicit, b"").unwrap();
        let missing = dir.join("missing.so");

        let candidates = candidates_from(&[missing, explicit.clone()], &[], &["libfoo.so"]);
        assert_eq!(candidates, vec![explicit, PathBuf::from("libfoo.so")]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn library_names_are_not_empty() {
        assert!(!library_names().is_empty());
    }
}
