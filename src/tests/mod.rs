mod util;

mod recursive;
