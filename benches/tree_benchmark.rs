use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use webtree::{
    handler::{Handler, HandlerResolver},
    handlers::{CoreRouter, Layout, LayoutBuilder, LoginHandler, ResourceTreeHandler},
    server::respond,
    BytesResource, HandlerExt, Request, VirtualTree, WebPath,
};

/// 深度为 `depth` 的嵌套布局，最内层是一个登录页
fn nested(depth: usize) -> (Arc<dyn Handler>, Arc<dyn Handler>) {
    let mut layout: LayoutBuilder = Layout::builder().section("leaf", LoginHandler::builder());
    for i in (0..depth).rev() {
        layout = Layout::builder().section(&format!("level{}", i), layout);
    }
    let root = CoreRouter::builder(layout).build();

    let mut current = Arc::clone(&root);
    for i in 0..depth {
        current = resolve(&current, &format!("level{}", i));
    }
    let leaf = resolve(&current, "leaf");
    (root, leaf)
}

fn resolve(handler: &Arc<dyn Handler>, name: &str) -> Arc<dyn Handler> {
    Arc::clone(handler)
        .into_handler_resolver()
        .and_then(|resolver| resolver.find(name))
        .unwrap()
}

fn path_arithmetic_benchmark(c: &mut Criterion) {
    let from = WebPath::parse("/shop/cart/items/");
    let to = WebPath::parse("/shop/catalog/books/rust/");
    let relative = WebPath::parse("../../catalog/./books/");

    c.bench_function("path_relative_to", |b| {
        b.iter(|| black_box(&from).relative_to(black_box(&to)));
    });
    c.bench_function("path_combine", |b| {
        b.iter(|| black_box(&from).combine(black_box(&relative)));
    });
}

fn ancestor_walk_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ancestor_walk");

    for depth in [2, 8, 32].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let (root, leaf) = nested(depth);
            let request = Request::try_from(b"GET / HTTP/1.1\r\n\r\n", 0, Arc::clone(&root)).unwrap();

            b.iter(|| {
                black_box(leaf.find_parent::<dyn HandlerResolver>(&root).unwrap());
                black_box(leaf.get_root(&request, false).unwrap());
            });
        });
    }

    group.finish();
}

fn route_benchmark(c: &mut Criterion) {
    let (root, leaf) = nested(8);
    let request = Request::try_from(b"GET /level0/level1/ HTTP/1.1\r\n\r\n", 0, Arc::clone(&root)).unwrap();

    c.bench_function("route_logical", |b| {
        b.iter(|| black_box(leaf.route(&request, black_box("level0/x"), true).unwrap()));
    });
    c.bench_function("route_dot_relative", |b| {
        b.iter(|| black_box(leaf.route(&request, black_box("./a/b"), false).unwrap()));
    });
}

fn respond_benchmark(c: &mut Criterion) {
    let mut tree = VirtualTree::new();
    for i in 0..50 {
        tree = tree
            .add_resource(Arc::new(BytesResource::new(&format!("file{}.txt", i), "content")))
            .unwrap();
    }
    let root = CoreRouter::builder(ResourceTreeHandler::builder(tree.build())).build();

    c.bench_function("respond_file", |b| {
        b.iter(|| black_box(respond(b"GET /file42.txt HTTP/1.1\r\n\r\n", 0, &root)));
    });
    c.bench_function("respond_listing", |b| {
        b.iter(|| black_box(respond(b"GET / HTTP/1.1\r\n\r\n", 0, &root)));
    });
}

criterion_group!(
    benches,
    path_arithmetic_benchmark,
    ancestor_walk_benchmark,
    route_benchmark,
    respond_benchmark
);
criterion_main!(benches);
