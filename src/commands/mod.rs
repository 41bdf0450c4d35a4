pub mod decode;
pub mod info;
pub mod scan;
pub mod segments;
pub mod trial;
