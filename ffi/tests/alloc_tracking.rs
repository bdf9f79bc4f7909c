//! Verify that the free functions release exactly what the library allocated.
//!
//! A counting global allocator tracks net bytes per thread, so the test
//! harness running other tests in parallel does not disturb the count.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use deepviz_ffi::types::{FfiDeepvizResult, FfiStatus};
use deepviz_ffi::{
    deepviz_bulk_download_request, deepviz_list_add, deepviz_list_free, deepviz_list_init,
    deepviz_result_free, deepviz_sample_report,
};

struct Counting;

thread_local! {
    static NET_BYTES: Cell<isize> = const { Cell::new(0) };
}

fn record(delta: isize) {
    let _ = NET_BYTES.try_with(|net| net.set(net.get() + delta));
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record(layout.size() as isize);
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        record(-(layout.size() as isize));
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record(new_size as isize - layout.size() as isize);
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static ALLOCATOR: Counting = Counting;

fn net_bytes_of(f: impl FnOnce()) -> isize {
    let before = NET_BYTES.with(Cell::get);
    f();
    NET_BYTES.with(Cell::get) - before
}

fn input_error() -> *mut FfiDeepvizResult {
    deepviz_sample_report(std::ptr::null(), c"key".as_ptr(), std::ptr::null())
}

#[test]
fn result_free_releases_everything() {
    // First call initializes the shared client.
    let mut warm_up = input_error();
    deepviz_result_free(&mut warm_up);

    let net = net_bytes_of(|| {
        let mut result = input_error();
        assert_eq!(unsafe { (*result).status }, FfiStatus::InputError);
        deepviz_result_free(&mut result);
        assert!(result.is_null());
    });
    assert_eq!(net, 0);
}

#[test]
fn list_free_releases_everything() {
    let net = net_bytes_of(|| {
        let mut list = deepviz_list_init(4);
        assert!(deepviz_list_add(list, c"a6ca3b8c79e1b7e2a6ef046b0702aeb2".as_ptr()));
        assert!(deepviz_list_add(list, c"44d88612fea8a8f36de82e1278abb02f".as_ptr()));
        deepviz_list_free(&mut list);
        assert!(list.is_null());
    });
    assert_eq!(net, 0);
}

#[test]
fn rejected_list_operation_leaks_nothing() {
    let mut warm_up = input_error();
    deepviz_result_free(&mut warm_up);

    let net = net_bytes_of(|| {
        let mut list = deepviz_list_init(2);
        let mut result = deepviz_bulk_download_request(list, c"key".as_ptr());
        assert_eq!(unsafe { (*result).status }, FfiStatus::InputError);
        deepviz_result_free(&mut result);
        deepviz_list_free(&mut list);
    });
    assert_eq!(net, 0);
}
