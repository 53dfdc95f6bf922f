use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use squeezenet_engine::schema::{encode_layer_table, EngineConfig, LayerDescriptor, Pool};

fn single_conv_layer(width: usize, channels_in: usize, channels_out: usize) -> Vec<f32> {
    let layer = LayerDescriptor {
        name: "bench".into(),
        width,
        height: width,
        channels_in,
        channels_out,
        kernel: 3,
        pad: 1,
        stride: 1,
        mem_addr_input: 0,
        mem_addr_output: width * width * channels_in,
        mem_addr_weights: 0,
        is_expand_layer: false,
        pool: Pool::None,
    };

    let table = encode_layer_table(&[layer]);
    let weights_len = channels_in * channels_out * 9 + channels_out;
    let input_len = width * width * channels_in;
    let output_len = width * width * channels_out;

    let mut dram = table;
    dram.extend(std::iter::repeat(0.1f32).take(weights_len));
    dram.extend(std::iter::repeat(1.0f32).take(input_len));
    dram.extend(std::iter::repeat(0.0f32).take(output_len));
    dram
}

fn bench_single_layer(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_conv_layer");
    for &(width, ch_in, ch_out) in &[(16usize, 8usize, 8usize), (32, 16, 16), (56, 32, 32)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{width}x{ch_in}->{ch_out}")),
            &(width, ch_in, ch_out),
            |b, &(width, ch_in, ch_out)| {
                let weights_len = ch_in * ch_out * 9 + ch_out;
                let weights_offset = 12u32;
                let input_offset = 12 + weights_len as u32;
                b.iter_batched(
                    || single_conv_layer(width, ch_in, ch_out),
                    |mut dram| {
                        squeezenet_engine::compute::run(
                            black_box(&mut dram),
                            1,
                            weights_offset,
                            input_offset,
                        )
                        .unwrap();
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_parallel_vs_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("output_channel_parallelism");
    let width = 28;
    let ch_in = 64;
    let ch_out = 64;
    let weights_len = ch_in * ch_out * 9 + ch_out;
    let weights_offset = 12u32;
    let input_offset = 12 + weights_len as u32;

    for n_pe in [1usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(n_pe), &n_pe, |b, &n_pe| {
            let config = EngineConfig {
                n_pe,
                ..EngineConfig::default()
            };
            b.iter_batched(
                || single_conv_layer(width, ch_in, ch_out),
                |mut dram| {
                    squeezenet_engine::compute::run_with_config(
                        black_box(&mut dram),
                        1,
                        weights_offset,
                        input_offset,
                        config.clone(),
                    )
                    .unwrap();
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_layer, bench_parallel_vs_sequential);
criterion_main!(benches);
