use bytes::Bytes;
use lazy_static::lazy_static;

use crate::{FileBody, NodeContent, PathRev, Properties, SymlinkTarget};

pub const HELLOWORLD_BLOB_CONTENTS: &[u8] = b"Hello World!";

lazy_static! {
    // 2 bytes
    pub static ref BLOB_A: Bytes = vec![0x00, 0x01].into();

    // 1MB
    pub static ref BLOB_B: Bytes = (0..255).collect::<Vec<u8>>().repeat(4 * 1024).into();

    pub static ref TRUNK_R1: PathRev = PathRev::committed(1, "trunk").unwrap();

    pub static ref DIR_CONTENT: NodeContent = NodeContent::dir(Properties::from([(
        "svn:ignore".to_string(),
        Bytes::from_static(b"target\n"),
    )]));
    pub static ref FILE_CONTENT_V1: NodeContent = NodeContent::file(
        Properties::from([(
            "svn:mime-type".to_string(),
            Bytes::from_static(b"text/plain"),
        )]),
        FileBody::new(HELLOWORLD_BLOB_CONTENTS),
    );
    pub static ref FILE_CONTENT_V2: NodeContent =
        NodeContent::file(Properties::new(), FileBody::new(BLOB_A.clone()));
    pub static ref SYMLINK_CONTENT: NodeContent = NodeContent::symlink(
        Properties::new(),
        SymlinkTarget::try_from("../trunk").unwrap(),
    );
}
