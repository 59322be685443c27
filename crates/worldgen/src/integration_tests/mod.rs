mod generation_determinism;
mod harness_bootstrap;
mod house_packing;
mod road_connectivity;
